//! Common utilities and types shared across Sealwire crates.
//!
//! This crate provides the error taxonomy and the caller-facing secret type
//! so that the codec and its callers agree on both.

pub mod error;
pub mod types;

pub use error::{DecodeError, EncodeError, Error, Result};
pub use types::Secret;
