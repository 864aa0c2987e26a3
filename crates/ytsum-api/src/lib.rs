//! Axum HTTP API server.
//!
//! This crate provides:
//! - Summary and chat streams relayed from an OpenRouter-compatible gateway
//! - A transcript proxy and a full fallback-chain resolver
//! - Tiered rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, OpenRouterConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{StaticSubscriptionGate, SubscriptionGate};
pub use state::AppState;
