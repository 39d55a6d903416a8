//! Error types for the OAuth handshake.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur while beginning or completing an OAuth handshake.
///
/// Variants never carry token material: a mismatched or expired state token
/// reports only [`HandshakeError::InvalidState`].
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A required callback parameter was absent.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// The name of the missing parameter.
        name: &'static str,
    },

    /// The shop domain did not match the expected provider pattern.
    #[error("Invalid shop domain: {domain}")]
    InvalidShopDomain {
        /// The rejected domain.
        domain: String,
    },

    /// The gateway host URL is required for redirects but was not configured.
    #[error("Gateway host URL is not configured")]
    MissingHostConfig,

    /// No stored state matched the callback, or the supplied token differed.
    #[error("State token is missing, expired, or does not match")]
    InvalidState,

    /// The callback signature did not verify against any configured secret.
    #[error("Callback signature verification failed")]
    InvalidSignature,

    /// The provider rejected the authorization code exchange.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The token endpoint could not be reached.
    #[error("Token endpoint unreachable: {message}")]
    UpstreamUnreachable {
        /// The underlying transport error.
        message: String,
    },
}

impl HandshakeError {
    /// Returns the error classification for HTTP mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } | Self::InvalidShopDomain { .. } => ErrorKind::Validation,
            Self::InvalidState | Self::InvalidSignature => ErrorKind::Authentication,
            Self::MissingHostConfig => ErrorKind::Configuration,
            Self::TokenExchangeFailed { .. } | Self::UpstreamUnreachable { .. } => {
                ErrorKind::Upstream
            }
        }
    }
}
