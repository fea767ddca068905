pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state_api;

pub use routes::create_router;
