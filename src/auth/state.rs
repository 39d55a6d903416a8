//! State token handling for OAuth CSRF protection.
//!
//! This module provides the [`StateToken`] type generated when an OAuth
//! flow begins. The token is persisted with the shop domain as its value
//! and a short TTL, and must round-trip unchanged through the provider's
//! authorization redirect; the callback handler consumes it exactly once.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// How long a pending state token stays valid.
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Generates a random alphanumeric token of the given length using a
/// cryptographically secure random number generator.
pub(crate) fn random_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// An OAuth state token for CSRF protection.
///
/// The token ties an authorization callback to the install request that
/// started it: the callback is rejected unless it carries the exact token
/// stored for the shop, and the stored token is deleted on first lookup
/// regardless of outcome.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::auth::StateToken;
///
/// let state = StateToken::new();
/// assert_eq!(state.as_ref().len(), 32);
/// assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateToken {
    value: String,
}

// Verify StateToken is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateToken>();
};

impl StateToken {
    /// The length of generated tokens. 32 alphanumeric characters carry
    /// more than 128 bits of entropy.
    pub const TOKEN_LENGTH: usize = 32;

    /// Creates a new state token with a cryptographically secure random value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: random_token(Self::TOKEN_LENGTH),
        }
    }

    /// Creates a state token from a raw string.
    ///
    /// Used when rehydrating a token that was previously stored. The string
    /// is taken as-is without validation.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }
}

impl Default for StateToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for StateToken {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
