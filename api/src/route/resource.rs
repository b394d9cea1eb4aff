use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    check_availability, reservation_history, reserve_resource, show_resource_reservations,
};
use crate::handler::resource::{
    deactivate_resource, register_resource, show_resource, show_resource_list, update_resource,
};

pub fn build_resource_routers() -> Router<AppRegistry> {
    let resource_routers = Router::new()
        .route("/", post(register_resource))
        .route("/", get(show_resource_list))
        .route("/:resource_id", get(show_resource))
        .route("/:resource_id", put(update_resource))
        .route("/:resource_id", delete(deactivate_resource))
        .route("/:resource_id/availability", get(check_availability))
        .route("/:resource_id/reservations", post(reserve_resource))
        .route("/:resource_id/reservations", get(show_resource_reservations))
        .route(
            "/:resource_id/reservations/history",
            get(reservation_history),
        );

    Router::new().nest("/resources", resource_routers)
}
