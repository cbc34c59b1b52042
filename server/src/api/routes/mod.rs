//! API route handlers

pub mod health;
pub mod posts;
pub mod products;

use std::sync::Arc;

use super::resources::Resources;
use crate::query::QueryExecutor;

/// Shared state for list endpoints
#[derive(Clone)]
pub struct ListingState {
    pub executor: QueryExecutor,
    pub resources: Arc<Resources>,
}
