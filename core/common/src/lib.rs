//! Common utilities and types shared across sharesweep crates.
//!
//! Provides the error type every library crate propagates and the small
//! identifier/secret types passed between the Drive clients and the audit.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{FileId, Secret};
