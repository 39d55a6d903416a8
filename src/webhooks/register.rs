//! Compliance webhook registration.
//!
//! After a handshake completes, the gateway registers the mandatory
//! privacy topics with the provider so deliveries arrive at its webhook
//! endpoint.

use serde::Serialize;

use crate::config::{GatewayConfig, ShopDomain};
use crate::webhooks::dispatch::ComplianceTopic;
use crate::webhooks::error::WebhookError;

/// Path on the gateway host that receives webhook deliveries.
pub const WEBHOOK_PATH: &str = "/webhooks";

#[derive(Serialize)]
struct RegistrationBody<'a> {
    webhook: RegistrationWebhook<'a>,
}

#[derive(Serialize)]
struct RegistrationWebhook<'a> {
    topic: &'a str,
    address: &'a str,
    format: &'a str,
}

/// Registers the compliance webhook topics for a shop.
///
/// Sends one registration per topic to the shop's admin API, addressed to
/// the gateway's webhook endpoint. Stops at the first failure.
///
/// # Errors
///
/// - [`WebhookError::HostNotConfigured`] when the gateway host URL needed
///   for the callback address is missing
/// - [`WebhookError::RegistrationFailed`] when the provider rejects a
///   registration
/// - [`WebhookError::UpstreamUnreachable`] on transport failure
pub async fn register_compliance_webhooks(
    config: &GatewayConfig,
    shop: &ShopDomain,
    access_token: &str,
) -> Result<(), WebhookError> {
    let host = config.host().ok_or(WebhookError::HostNotConfigured)?;
    let address = format!("{}{}", host.as_ref(), WEBHOOK_PATH);

    let url = format!(
        "{}/admin/api/{}/webhooks.json",
        config.upstream_base(shop),
        config.api_version()
    );

    let client = reqwest::Client::builder()
        .timeout(config.upstream_timeout())
        .build()
        .map_err(|e| WebhookError::UpstreamUnreachable {
            message: e.to_string(),
        })?;

    for topic in ComplianceTopic::ALL {
        let body = RegistrationBody {
            webhook: RegistrationWebhook {
                topic: topic.as_str(),
                address: &address,
                format: "json",
            },
        };

        let response = client
            .post(&url)
            .header("X-Shopify-Access-Token", access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WebhookError::UpstreamUnreachable {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WebhookError::RegistrationFailed { status, message });
        }

        tracing::debug!(
            shop = shop.as_ref(),
            topic = topic.as_str(),
            "registered compliance webhook"
        );
    }

    Ok(())
}
