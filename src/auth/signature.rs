//! HMAC-SHA256 signature computation and verification.
//!
//! This module provides the signature primitives used to verify OAuth
//! callbacks (hex-encoded signatures over the sorted query string) and
//! webhook deliveries (base64-encoded signatures over the raw body).
//!
//! # Security
//!
//! All signature comparisons use constant-time comparison to prevent
//! timing attacks. Verification supports key rotation by falling back to
//! an old secret key when the primary key fails.
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::auth::signature::{compute_signature, compute_signature_base64};
//!
//! // Hex-encoded signature for OAuth callbacks
//! let message = "code=abc123&shop=example.myshopify.com&state=xyz";
//! let signature = compute_signature(message, "my-api-secret");
//! assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
//!
//! // Base64-encoded signature for webhook bodies
//! let webhook_sig = compute_signature_base64(b"webhook payload", "my-api-secret");
//! assert_eq!(webhook_sig.len(), 44); // Base64 of 32 bytes
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::callback::CallbackParams;
use crate::config::GatewayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Computes an HMAC-SHA256 signature for the given message.
///
/// The signature is returned as a lowercase hexadecimal string, which is
/// the format the provider attaches to authorization callbacks.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::auth::signature::compute_signature;
///
/// let sig = compute_signature("test-message", "secret-key");
/// assert_eq!(sig.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

/// Computes an HMAC-SHA256 signature for raw bytes, returning base64-encoded output.
///
/// This is the webhook signature format: the provider sends base64-encoded
/// signatures of the raw request body in the `X-Shopify-Hmac-SHA256` header.
/// The message is taken as raw bytes to preserve the exact payload without
/// UTF-8 interpretation.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    BASE64_STANDARD.encode(result.into_bytes())
}

/// Performs constant-time comparison of two strings.
///
/// Used for security-sensitive comparisons like signature verification and
/// state token validation to prevent timing attacks.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // ConstantTimeEq handles different lengths securely
    a_bytes.ct_eq(b_bytes).into()
}

/// Verifies the signature of an OAuth authorization callback.
///
/// The expected signature is an HMAC-SHA256 over the callback's signable
/// query string (all parameters except the signature itself, sorted by key
/// and joined with `&`), hex-encoded.
///
/// # Key Rotation Support
///
/// If verification with the primary `api_secret_key` fails, the old secret
/// key is tried when configured. This keeps in-flight OAuth flows working
/// across a key rotation.
#[must_use]
pub fn verify_authorization_signature(params: &CallbackParams, config: &GatewayConfig) -> bool {
    let Some(received) = params.hmac() else {
        return false;
    };
    let signable = params.to_signable_string();

    let computed = compute_signature(&signable, config.api_secret_key().as_ref());
    if constant_time_compare(&computed, received) {
        return true;
    }

    if let Some(old_secret) = config.old_api_secret_key() {
        let computed_old = compute_signature(&signable, old_secret.as_ref());
        if constant_time_compare(&computed_old, received) {
            return true;
        }
    }

    false
}

/// Verifies the signature of a webhook delivery.
///
/// The expected signature is an HMAC-SHA256 over the raw request body,
/// base64-encoded. The same old-key fallback as
/// [`verify_authorization_signature`] applies.
#[must_use]
pub fn verify_webhook_signature(body: &[u8], received: &str, config: &GatewayConfig) -> bool {
    let computed = compute_signature_base64(body, config.api_secret_key().as_ref());
    if constant_time_compare(&computed, received) {
        return true;
    }

    if let Some(old_secret) = config.old_api_secret_key() {
        let computed_old = compute_signature_base64(body, old_secret.as_ref());
        if constant_time_compare(&computed_old, received) {
            return true;
        }
    }

    false
}

// Internal hex encoding since we don't want to add another dependency
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut result = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
