pub mod handlers;
pub mod integration;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
