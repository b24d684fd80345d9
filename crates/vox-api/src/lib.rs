//! Axum HTTP API server.
//!
//! This crate provides:
//! - Generation endpoints over the orchestration engine
//! - Platform bearer-token verification
//! - Rate limiting and security headers
//! - Prometheus metrics
//! - Stale-generation sweeping

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use auth::TokenVerifier;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use sweeper::StaleGenerationSweeper;
