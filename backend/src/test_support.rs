//! Test utilities for the crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via
//! the `test-support` feature). Nothing here is used in production wiring.

pub mod clock;
pub mod fixtures;
pub mod gateway;
pub mod in_memory;
