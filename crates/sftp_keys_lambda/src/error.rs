use std::path::PathBuf;

use thiserror::Error;

/// Cold-start configuration failures. The Lambda binaries exit on these
/// before serving any event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum KeyManagementError {
    #[error("Invalid request type: {0}")]
    InvalidRequestType(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("storage operation on '{key}' failed: {message}")]
    Storage { key: String, message: String },
    #[error("secret '{name}' could not be stored: {message}")]
    Secrets { name: String, message: String },
    #[error("transfer service call failed: {0}")]
    Transfer(String),
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    #[error("scratch file '{}' is not usable: {source}", .path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KeyManagementError {
    pub fn storage(key: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn scratch(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scratch {
            path: path.into(),
            source,
        }
    }
}

impl From<ssh_key::Error> for KeyManagementError {
    fn from(error: ssh_key::Error) -> Self {
        Self::KeyGeneration(error.to_string())
    }
}

impl From<rsa::Error> for KeyManagementError {
    fn from(error: rsa::Error) -> Self {
        Self::KeyGeneration(error.to_string())
    }
}

impl From<rsa::pkcs1::Error> for KeyManagementError {
    fn from(error: rsa::pkcs1::Error) -> Self {
        Self::KeyGeneration(error.to_string())
    }
}
