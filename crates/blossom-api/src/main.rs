//! # blossom-payd
//!
//! Development payment server for the Blossom payment flow.
//!
//! ## Usage
//!
//! ```bash
//! export PORT=8080
//! blossom-payd
//!
//! # settle an invoice by hand
//! curl -X PUT localhost:8080/api/blossom/payment/inv_... -d '{"status":"paid"}' \
//!      -H 'content-type: application/json'
//! ```

use blossom_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let state = AppState::new();
    let addr = state.config.socket_addr()?;

    info!("Environment: {}", state.config.environment);
    info!("Invoice TTL: {}s", state.config.invoice_ttl_secs);
    if state.config.is_production() {
        warn!("blossom-payd is a development server; invoices are never really settled");
    }

    let app = routes::create_router(state);

    info!("blossom-payd {} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);
    info!("Issue invoice: POST http://{}/api/blossom/invoice", addr);
    info!("Poll status:   GET  http://{}/api/blossom/payment/{{id}}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
