use axum::{
    routing::{get, patch},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    show_my_reservations, show_reservation, transition_reservation,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservation_routers = Router::new()
        .route("/me", get(show_my_reservations))
        .route("/:reservation_id", get(show_reservation))
        .route("/:reservation_id", patch(transition_reservation));

    Router::new().nest("/reservations", reservation_routers)
}
