//! Compliance webhook dispatch.
//!
//! Routes verified webhook deliveries to their handlers. The gateway
//! handles the three mandatory privacy topics; `shop/redact` removes the
//! shop's installation record, while the customer topics carry no stored
//! data here and are acknowledged after logging.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::GatewayConfig;
use crate::store::MerchantStore;
use crate::webhooks::error::WebhookError;
use crate::webhooks::verification::{verify_webhook, WebhookRequest};

/// The mandatory compliance webhook topics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceTopic {
    /// A customer requested their data.
    #[serde(rename = "customers/data_request")]
    CustomersDataRequest,
    /// A customer requested erasure of their data.
    #[serde(rename = "customers/redact")]
    CustomersRedact,
    /// The shop uninstalled 48 hours ago and must be erased.
    #[serde(rename = "shop/redact")]
    ShopRedact,
}

impl ComplianceTopic {
    /// All topics the gateway registers and handles.
    pub const ALL: [Self; 3] = [
        Self::CustomersDataRequest,
        Self::CustomersRedact,
        Self::ShopRedact,
    ];

    /// Returns the provider's topic string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
        }
    }
}

impl fmt::Display for ComplianceTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplianceTopic {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customers/data_request" => Ok(Self::CustomersDataRequest),
            "customers/redact" => Ok(Self::CustomersRedact),
            "shop/redact" => Ok(Self::ShopRedact),
            other => Err(WebhookError::UnknownTopic {
                topic: other.to_string(),
            }),
        }
    }
}

/// Payload shape shared by the compliance topics.
#[derive(Deserialize)]
struct CompliancePayload {
    shop_domain: String,
}

/// Verifies and dispatches a webhook delivery.
///
/// The signature is checked against the raw body before anything is
/// parsed. Topic resolution follows: a missing topic header or a topic
/// outside the compliance set is rejected after verification, so callers
/// can distinguish a forged delivery from an unhandled one.
///
/// `shop/redact` deletes the shop's installation record; deleting an
/// already-absent record succeeds. The customer topics are acknowledged
/// after logging since the gateway stores no customer data.
///
/// # Errors
///
/// - [`WebhookError::InvalidSignature`] when the signature fails
/// - [`WebhookError::MissingTopic`] when no topic header is present
/// - [`WebhookError::UnknownTopic`] for topics outside the compliance set
/// - [`WebhookError::MalformedPayload`] when a handled topic's body does
///   not parse
pub fn handle_webhook(
    config: &GatewayConfig,
    merchants: &MerchantStore,
    request: &WebhookRequest,
) -> Result<(), WebhookError> {
    verify_webhook(config, request)?;

    let topic_raw = request.topic().ok_or(WebhookError::MissingTopic)?;
    let topic: ComplianceTopic = topic_raw.parse()?;

    match topic {
        ComplianceTopic::ShopRedact => {
            let payload: CompliancePayload = serde_json::from_slice(request.body())
                .map_err(|e| WebhookError::MalformedPayload {
                    reason: e.to_string(),
                })?;

            let shop = config.shop_domain(&payload.shop_domain).map_err(|_| {
                WebhookError::MalformedPayload {
                    reason: format!("invalid shop domain: {}", payload.shop_domain),
                }
            })?;

            merchants.delete(&shop);
            tracing::info!(shop = shop.as_ref(), "erased shop data on redact webhook");
        }
        ComplianceTopic::CustomersDataRequest | ComplianceTopic::CustomersRedact => {
            // No customer data is stored; acknowledging is sufficient
            tracing::info!(
                topic = topic.as_str(),
                shop = request.shop_domain().unwrap_or("unknown"),
                "acknowledged compliance webhook"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::signature::compute_signature_base64;
    use crate::config::{ApiKey, ApiSecretKey};
    use crate::store::{MemoryStore, MerchantRecord};
    use chrono::Utc;
    use std::sync::Arc;

    fn test_config() -> GatewayConfig {
        GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("webhook-secret").unwrap())
            .build()
            .unwrap()
    }

    fn installed_merchants(shop: &str) -> MerchantStore {
        let merchants = MerchantStore::new(Arc::new(MemoryStore::new()));
        merchants.put(&MerchantRecord {
            shop: shop.to_string(),
            access_token: "shpat_token".to_string(),
            scopes: "read_products".parse().unwrap(),
            installed_at: Utc::now(),
        });
        merchants
    }

    fn signed(body: &[u8], topic: &str) -> WebhookRequest {
        WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, "webhook-secret")),
            Some(topic.to_string()),
            Some("test-shop.myshopify.com".to_string()),
        )
    }

    #[test]
    fn test_topic_round_trips_through_strings() {
        for topic in ComplianceTopic::ALL {
            assert_eq!(topic.as_str().parse::<ComplianceTopic>().unwrap(), topic);
        }
        assert!(matches!(
            "orders/create".parse::<ComplianceTopic>(),
            Err(WebhookError::UnknownTopic { .. })
        ));
    }

    #[test]
    fn test_shop_redact_deletes_merchant_record() {
        let config = test_config();
        let merchants = installed_merchants("test-shop.myshopify.com");
        let shop = config.shop_domain("test-shop").unwrap();
        assert!(merchants.get(&shop).is_some());

        let body = br#"{"shop_domain":"test-shop.myshopify.com"}"#;
        handle_webhook(&config, &merchants, &signed(body, "shop/redact")).unwrap();

        assert!(merchants.get(&shop).is_none());
    }

    #[test]
    fn test_shop_redact_for_unknown_shop_succeeds() {
        let config = test_config();
        let merchants = MerchantStore::new(Arc::new(MemoryStore::new()));

        let body = br#"{"shop_domain":"ghost.myshopify.com"}"#;
        assert!(handle_webhook(&config, &merchants, &signed(body, "shop/redact")).is_ok());
    }

    #[test]
    fn test_customer_topics_are_acknowledged() {
        let config = test_config();
        let merchants = installed_merchants("test-shop.myshopify.com");
        let body = br#"{"shop_domain":"test-shop.myshopify.com","customer":{"id":1}}"#;

        for topic in ["customers/data_request", "customers/redact"] {
            assert!(handle_webhook(&config, &merchants, &signed(body, topic)).is_ok());
        }

        // The record is untouched
        let shop = config.shop_domain("test-shop").unwrap();
        assert!(merchants.get(&shop).is_some());
    }

    #[test]
    fn test_invalid_signature_rejected_before_dispatch() {
        let config = test_config();
        let merchants = installed_merchants("test-shop.myshopify.com");

        let body = br#"{"shop_domain":"test-shop.myshopify.com"}"#;
        let request = WebhookRequest::new(
            body.to_vec(),
            Some("not-a-signature".to_string()),
            Some("shop/redact".to_string()),
            None,
        );

        assert!(matches!(
            handle_webhook(&config, &merchants, &request),
            Err(WebhookError::InvalidSignature)
        ));

        // The record survives a forged redact
        let shop = config.shop_domain("test-shop").unwrap();
        assert!(merchants.get(&shop).is_some());
    }

    #[test]
    fn test_missing_topic_rejected() {
        let config = test_config();
        let merchants = MerchantStore::new(Arc::new(MemoryStore::new()));

        let body = b"{}";
        let request = WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, "webhook-secret")),
            None,
            None,
        );

        assert!(matches!(
            handle_webhook(&config, &merchants, &request),
            Err(WebhookError::MissingTopic)
        ));
    }

    #[test]
    fn test_malformed_redact_payload_rejected() {
        let config = test_config();
        let merchants = MerchantStore::new(Arc::new(MemoryStore::new()));

        let body = br#"{"unexpected":true}"#;
        assert!(matches!(
            handle_webhook(&config, &merchants, &signed(body, "shop/redact")),
            Err(WebhookError::MalformedPayload { .. })
        ));
    }
}
