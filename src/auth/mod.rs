//! Authentication: OAuth handshake, signatures, state tokens, and scopes.
//!
//! # Modules
//!
//! - [`handshake`]: install initiation and callback completion
//! - [`signature`]: HMAC-SHA256 computation and verification
//! - [`callback`]: parsed OAuth callback parameters
//! - [`state`]: single-use CSRF state tokens
//! - [`scopes`]: OAuth scope parsing and implied-scope expansion
//! - [`error`]: handshake error types

pub mod callback;
pub mod error;
pub mod handshake;
pub mod scopes;
pub mod signature;
pub mod state;

pub use callback::CallbackParams;
pub use error::HandshakeError;
pub use handshake::{begin_install, complete_install, InstallRedirect};
pub use scopes::AuthScopes;
pub use state::{StateToken, STATE_TTL};
