//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware;
use super::openapi::openapi_json;
use super::routes::{ListingState, health, posts, products};
use crate::core::CoreApp;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let router = build_router(ListingState {
            executor: app.executor.clone(),
            resources: app.resources.clone(),
        });

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "Listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Assemble every route with the shared layers
pub fn build_router(state: ListingState) -> Router {
    Router::new()
        .route("/api/openapi.json", get(openapi_json))
        .merge(health::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(posts::routes(state))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
