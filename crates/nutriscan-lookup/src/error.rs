//! # Lookup Error Types
//!
//! Error types for the lookup layer.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Lookup Error Types                              │
//! │                                                                         │
//! │  Configuration Errors                                                   │
//! │  ├── InvalidConfig     - Bad config values                              │
//! │  ├── InvalidUrl        - Malformed base URL                             │
//! │  ├── ConfigLoadFailed  - Can't read/parse config file                   │
//! │  └── ConfigSaveFailed  - Can't write config file                        │
//! │                                                                         │
//! │  Transport Errors                                                       │
//! │  ├── ConnectionFailed  - Network unreachable, DNS, TLS                  │
//! │  ├── Timeout           - No answer within the configured timeout        │
//! │  └── HttpStatus        - Non-success HTTP response                      │
//! │                                                                         │
//! │  Protocol Errors                                                        │
//! │  └── DecodeFailed      - Body is not the JSON we asked for              │
//! │                                                                         │
//! │  Input / Internal                                                       │
//! │  ├── InvalidBarcode    - Rejected before any request                    │
//! │  └── Internal          - Task join failures and the like                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers of [`crate::resolver::ProductResolver`] never see these directly:
//! the resolver folds them into `LookupOutcome::TransportError { reason }`.
//! Nothing here is retried.

use nutriscan_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Lookup error type covering config, transport and decode failures.
#[derive(Debug, Error)]
pub enum LookupError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scanner configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid product database URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The product database answered with a non-success status.
    #[error("Product database returned HTTP {status}")]
    HttpStatus { status: u16 },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Response body could not be decoded.
    #[error("Invalid response body: {0}")]
    DecodeFailed(String),

    // =========================================================================
    // Input / Internal Errors
    // =========================================================================
    /// Barcode rejected before lookup.
    #[error("Invalid barcode: {0}")]
    InvalidBarcode(#[from] ValidationError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            LookupError::HttpStatus {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            LookupError::DecodeFailed(err.to_string())
        } else if err.is_builder() {
            LookupError::InvalidConfig(err.to_string())
        } else {
            LookupError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::DecodeFailed(err.to_string())
    }
}

impl From<url::ParseError> for LookupError {
    fn from(err: url::ParseError) -> Self {
        LookupError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        LookupError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for LookupError {
    fn from(err: toml::de::Error) -> Self {
        LookupError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for LookupError {
    fn from(err: toml::ser::Error) -> Self {
        LookupError::ConfigSaveFailed(err.to_string())
    }
}

impl From<CoreError> for LookupError {
    fn from(err: CoreError) -> Self {
        LookupError::InvalidConfig(err.to_string())
    }
}

impl From<tokio::task::JoinError> for LookupError {
    fn from(err: tokio::task::JoinError) -> Self {
        LookupError::Internal(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl LookupError {
    /// Returns true if this error came from the network or the remote service.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            LookupError::ConnectionFailed(_)
                | LookupError::Timeout(_)
                | LookupError::HttpStatus { .. }
                | LookupError::DecodeFailed(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LookupError::InvalidConfig(_)
                | LookupError::InvalidUrl(_)
                | LookupError::ConfigLoadFailed(_)
                | LookupError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Haptic Error
// =============================================================================

/// A haptic pulse could not be delivered. Always ignored by the session.
#[derive(Debug, Error)]
#[error("Haptic pulse failed: {0}")]
pub struct HapticError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(LookupError::ConnectionFailed("refused".into()).is_transport_error());
        assert!(LookupError::HttpStatus { status: 503 }.is_transport_error());
        assert!(LookupError::Timeout("10s".into()).is_transport_error());
        assert!(!LookupError::InvalidConfig("bad".into()).is_transport_error());

        assert!(LookupError::InvalidUrl("nope".into()).is_config_error());
        assert!(!LookupError::DecodeFailed("eof".into()).is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = LookupError::HttpStatus { status: 503 };
        assert_eq!(err.to_string(), "Product database returned HTTP 503");

        let err: LookupError = ValidationError::Required {
            field: "barcode".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid barcode: barcode is required");
    }
}
