//! Paddock Core - Domain Types
//!
//! Shared data structures, errors and retry policy. Every other crate in the
//! workspace depends on this one; it performs no I/O of its own.

pub mod chain;
pub mod config;
pub mod envelope;
pub mod error;
pub mod racing;

pub use chain::*;
pub use config::{CountBound, RetryPolicy};
pub use envelope::SignedEnvelope;
pub use error::*;
pub use racing::*;
