//! Webhook signature verification.
//!
//! The provider signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, base64-encoded in the `X-Shopify-Hmac-SHA256` header. The
//! body must be verified as received, before any parsing.

use crate::auth::signature::verify_webhook_signature;
use crate::config::GatewayConfig;
use crate::webhooks::error::WebhookError;

/// HTTP header name for the HMAC-SHA256 signature.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// HTTP header name for the webhook topic (e.g. `shop/redact`).
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header name for the shop domain the delivery concerns.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// An incoming webhook delivery.
///
/// The body is kept as raw bytes so the signature is computed over the
/// exact payload, without UTF-8 interpretation.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: Option<String>,
    topic: Option<String>,
    shop_domain: Option<String>,
}

impl WebhookRequest {
    /// Creates a webhook request from the raw body and header values.
    #[must_use]
    pub fn new(
        body: Vec<u8>,
        hmac_header: Option<String>,
        topic: Option<String>,
        shop_domain: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
        }
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the signature header value, if present.
    #[must_use]
    pub fn hmac_header(&self) -> Option<&str> {
        self.hmac_header.as_deref()
    }

    /// Returns the topic header value, if present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the shop domain header value, if present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }
}

/// Verifies a webhook delivery's signature.
///
/// A delivery without a signature header fails the same way as one with a
/// wrong signature. Key rotation fallback applies as for OAuth callbacks.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidSignature`] when verification fails.
pub fn verify_webhook(
    config: &GatewayConfig,
    request: &WebhookRequest,
) -> Result<(), WebhookError> {
    let Some(received) = request.hmac_header() else {
        return Err(WebhookError::InvalidSignature);
    };

    if verify_webhook_signature(request.body(), received, config) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::signature::compute_signature_base64;
    use crate::config::{ApiKey, ApiSecretKey};

    fn test_config() -> GatewayConfig {
        GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("webhook-secret").unwrap())
            .build()
            .unwrap()
    }

    fn signed_request(body: &[u8], secret: &str) -> WebhookRequest {
        WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, secret)),
            Some("shop/redact".to_string()),
            Some("test-shop.myshopify.com".to_string()),
        )
    }

    #[test]
    fn test_verify_webhook_accepts_valid_signature() {
        let config = test_config();
        let request = signed_request(br#"{"shop_domain":"x"}"#, "webhook-secret");

        assert!(verify_webhook(&config, &request).is_ok());
    }

    #[test]
    fn test_verify_webhook_rejects_wrong_secret() {
        let config = test_config();
        let request = signed_request(br#"{"shop_domain":"x"}"#, "other-secret");

        assert!(matches!(
            verify_webhook(&config, &request),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_webhook_rejects_missing_header() {
        let config = test_config();
        let request = WebhookRequest::new(b"body".to_vec(), None, None, None);

        assert!(matches!(
            verify_webhook(&config, &request),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_webhook_rejects_tampered_body() {
        let config = test_config();
        let mut request = signed_request(br#"{"shop_domain":"x"}"#, "webhook-secret");
        request.body[0] ^= 0x01;

        assert!(matches!(
            verify_webhook(&config, &request),
            Err(WebhookError::InvalidSignature)
        ));
    }
}
