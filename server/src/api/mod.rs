//! API server and routes

pub mod extractors;
pub mod listing;
pub mod middleware;
pub mod openapi;
pub mod resources;
pub mod routes;
mod server;
pub mod types;

pub use resources::Resources;
pub use server::{ApiServer, build_router};
