//! # blossom-api
//!
//! Development payment server for blossom-pay.
//!
//! Issues invoices into an in-memory store and serves the Blossom payment
//! endpoints the flow controller polls. Settlement is simulated with `PUT`.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/blossom/invoice` | Issue an invoice |
//! | GET | `/api/blossom/payment/{id}` | Invoice status |
//! | PUT | `/api/blossom/payment/{id}` | Force a status |
//! | DELETE | `/api/blossom/payment/{id}` | Cancel a pending invoice |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use store::{InvoiceRecord, InvoiceStore};
