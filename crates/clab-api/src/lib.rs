//! Proxy API server for the ContentLabs pipeline.
//!
//! Holds the generative-service credential server-side and exposes one
//! `POST /api/generate/*` endpoint per call kind.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, CreditLedger};
