//! Chronos manuscript-submission integration.
//!
//! Serializes host preprints into the Chronos partner schema, talks to the
//! Chronos REST API and keeps local journal and submission mirrors in step
//! with the remote system.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
