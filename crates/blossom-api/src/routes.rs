//! # Routes
//!
//! Axum router configuration for the development payment server.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET    /health
/// - POST   /api/blossom/invoice - Issue an invoice
/// - GET    /api/blossom/payment/{invoice_id} - Invoice status
/// - PUT    /api/blossom/payment/{invoice_id} - Force a status (settlement simulation)
/// - DELETE /api/blossom/payment/{invoice_id} - Cancel a pending invoice
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let blossom_routes = Router::new()
        .route("/invoice", post(handlers::create_invoice))
        .route(
            "/payment/{invoice_id}",
            get(handlers::get_payment_status)
                .put(handlers::update_payment_status)
                .delete(handlers::cancel_payment),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/blossom", blossom_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
