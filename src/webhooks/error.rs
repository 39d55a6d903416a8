//! Error types for webhook verification, dispatch, and registration.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur while handling or registering webhooks.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature header was absent or did not verify.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The delivery carried no topic header.
    #[error("Missing webhook topic header")]
    MissingTopic,

    /// The topic is not one the gateway handles.
    #[error("Unknown webhook topic: {topic}")]
    UnknownTopic {
        /// The unrecognized topic string.
        topic: String,
    },

    /// The payload could not be parsed for the topic's handler.
    #[error("Malformed webhook payload: {reason}")]
    MalformedPayload {
        /// What failed to parse.
        reason: String,
    },

    /// The gateway host URL needed for the callback address is missing.
    #[error("Gateway host URL is not configured")]
    HostNotConfigured,

    /// The provider rejected a webhook registration request.
    #[error("Webhook registration failed with status {status}: {message}")]
    RegistrationFailed {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The provider could not be reached for registration.
    #[error("Webhook endpoint unreachable: {message}")]
    UpstreamUnreachable {
        /// The underlying transport error.
        message: String,
    },
}

impl WebhookError {
    /// Returns the error classification for HTTP mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature => ErrorKind::Authentication,
            Self::MissingTopic | Self::UnknownTopic { .. } | Self::MalformedPayload { .. } => {
                ErrorKind::Validation
            }
            Self::HostNotConfigured => ErrorKind::Configuration,
            Self::RegistrationFailed { .. } | Self::UpstreamUnreachable { .. } => {
                ErrorKind::Upstream
            }
        }
    }
}
