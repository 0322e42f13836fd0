//! Shared SFTP key management domain primitives.
//!
//! This crate owns the event/response contracts of the two key management
//! handlers and the object key layout of the key bucket. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod storage_keys;
