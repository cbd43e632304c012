//! # CLI Error Type
//!
//! Every failure the binary reports ends up here, with a machine-readable
//! `code` for `--json` consumers and a `message` for people.
//!
//! ```json
//! { "code": "LOOKUP_FAILED", "message": "Product database returned HTTP 503" }
//! ```

use nutriscan_core::ValidationError;
use nutriscan_lookup::LookupError;
use serde::Serialize;
use thiserror::Error;

/// Error returned from command handlers.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad command-line input
    InvalidInput,

    /// Config file or values rejected
    ConfigError,

    /// The product lookup failed
    LookupFailed,

    /// Stdin or stdout failed
    IoError,

    /// Anything else
    Internal,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn lookup_failed(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::LookupFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

impl From<LookupError> for CliError {
    fn from(err: LookupError) -> Self {
        let code = if err.is_config_error() {
            ErrorCode::ConfigError
        } else if err.is_transport_error() {
            ErrorCode::LookupFailed
        } else {
            match &err {
                LookupError::InvalidBarcode(_) => ErrorCode::InvalidInput,
                _ => ErrorCode::Internal,
            }
        };
        CliError::new(code, err.to_string())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::new(ErrorCode::InvalidInput, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("JSON encoding failed: {}", err))
    }
}

pub type CliResult<T> = Result<T, CliError>;
