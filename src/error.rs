//! Error taxonomy for the gateway.
//!
//! Every error in this crate maps to one of four categories via
//! [`ErrorKind`]: validation failures (malformed caller input, safe to
//! expose), authentication failures (signatures, state tokens, client
//! keys; messages carry no secret material), configuration failures
//! (missing operating parameters, operator-facing), and upstream failures
//! (the provider being unreachable).
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::error::{ConfigError, ErrorKind};
//!
//! let error = ConfigError::EmptyApiKey;
//! assert_eq!(error.kind(), ErrorKind::Configuration);
//! assert_eq!(error.kind().status_code(), 500);
//! ```

use serde::Serialize;
use thiserror::Error;

/// Category of a gateway failure, with its HTTP status mapping.
///
/// API-style callers receive the category implied by the status code;
/// the structured payload itself is [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing caller input. Always safe to expose.
    Validation,
    /// Signature, state, or credential failure.
    Authentication,
    /// Missing or invalid operating parameters. Operator-facing.
    Configuration,
    /// The upstream provider could not be reached.
    Upstream,
}

impl ErrorKind {
    /// Returns the HTTP status code this category maps to.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authentication => 401,
            Self::Configuration => 500,
            Self::Upstream => 502,
        }
    }
}

/// Structured error payload returned to API-style callers.
///
/// Rendering (JSON response, failure page) is the caller's concern; the
/// gateway only guarantees the message is safe for the error's category.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Human-readable description of the failure.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error payload from any displayable error.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Errors that can occur while configuring the gateway.
///
/// Builder and newtype constructors return these to enable fail-fast
/// validation. Variants raised on caller-supplied identifiers (such as
/// [`InvalidShopDomain`](Self::InvalidShopDomain)) classify as validation
/// errors; the rest are operator-facing configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid provider API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid provider API secret key.")]
    EmptyApiSecretKey,

    /// Provider domain cannot be empty.
    #[error("Provider domain cannot be empty. Please provide a domain such as 'myshopify.com'.")]
    EmptyProviderDomain,

    /// Shop domain does not match the required format.
    #[error("Invalid shop domain '{domain}'. Expected format: '<subdomain>.<provider-domain>'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2025-10') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://gateway.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },
}

impl ConfigError {
    /// Returns the taxonomy category for this error.
    ///
    /// `InvalidShopDomain` is raised on caller input and classifies as a
    /// validation error; everything else is an operator configuration
    /// problem.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShopDomain { .. } => ErrorKind::Validation,
            _ => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_error_message() {
        let error = ConfigError::EmptyApiKey;
        let message = error.to_string();
        assert!(message.contains("API key cannot be empty"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("Expected format"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "api_key" };
        let message = error.to_string();
        assert!(message.contains("api_key"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ConfigError::InvalidShopDomain {
                domain: "x".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(ConfigError::EmptyApiKey.kind(), ErrorKind::Configuration);
        assert_eq!(
            ConfigError::MissingRequiredField { field: "host" }.kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::Authentication.status_code(), 401);
        assert_eq!(ErrorKind::Configuration.status_code(), 500);
        assert_eq!(ErrorKind::Upstream.status_code(), 502);
    }

    #[test]
    fn test_error_body_serializes_to_error_field() {
        let body = ErrorBody::new("shop is not installed");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"shop is not installed"}"#);
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyApiKey;
        let _: &dyn std::error::Error = &error;
    }
}
