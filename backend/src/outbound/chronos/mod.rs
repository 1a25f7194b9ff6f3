//! Chronos partner API adapter.
//!
//! Implements the `ChronosGateway` port over HTTPS with a lazily refreshed
//! session key.

mod dto;
mod http_client;
mod session;

pub use http_client::{ChronosClientBuildError, ChronosClientConfig, ChronosHttpClient};
