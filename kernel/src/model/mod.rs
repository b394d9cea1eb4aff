pub mod id;
pub mod reservation;
pub mod resource;
pub mod role;
pub mod user;
