mod auth;
mod handlers;

pub use auth::CallerIdentity;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::AppContext;

/// Start the API server
pub async fn start_api_server(ctx: AppContext) -> Result<()> {
    let server = ctx.config.server.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create router with all routes
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        // Order intake
        .route("/api/orders", post(handlers::orders::create_order))
        // Payment processor notifications
        .route(
            "/webhooks/payments",
            post(handlers::webhook::receive_notification),
        )
        // Reporting
        .route(
            "/api/salespersons/:id",
            get(handlers::reports::get_salesperson),
        )
        .route(
            "/api/salespersons/:id/commissions",
            get(handlers::reports::get_commission_report),
        )
        // Add state and middleware
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Get bind address
    let addr = format!("{}:{}", server.host, server.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
