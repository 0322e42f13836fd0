//! AWS-oriented adapters and handlers for SFTP key management.
//!
//! This crate owns runtime integration details (Lambda handlers, AWS SDK
//! adapters, key generation) on top of the contracts and key layout defined
//! in `sftp_keys_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod facade;
pub mod handlers;
pub mod keygen;
pub mod logging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
