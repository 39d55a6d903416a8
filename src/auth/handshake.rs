//! OAuth handshake: install initiation and callback completion.
//!
//! This module implements both halves of the authorization code flow:
//!
//! 1. [`begin_install`] generates the authorization URL for a shop and
//!    persists a single-use state token for it.
//! 2. [`complete_install`] validates the provider's callback, exchanges
//!    the authorization code for an access token, and persists the
//!    merchant's installation record.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_gateway::auth::{begin_install, complete_install, CallbackParams};
//!
//! // Install request: redirect the merchant to the provider
//! let redirect = begin_install(&config, &states, "test-shop", "/auth/callback")?;
//! // ... send HTTP 302 to redirect.auth_url ...
//!
//! // Callback: validate and exchange
//! let params = CallbackParams::from_query(request_query);
//! let record = complete_install(&config, &states, &merchants, &params).await?;
//! ```

use chrono::Utc;

use crate::auth::callback::CallbackParams;
use crate::auth::error::HandshakeError;
use crate::auth::signature::{constant_time_compare, verify_authorization_signature};
use crate::auth::state::StateToken;
use crate::config::{GatewayConfig, ShopDomain};
use crate::store::{MerchantRecord, MerchantStore, StateStore};
use crate::webhooks::register_compliance_webhooks;

/// Result of initiating an install.
///
/// The state token is already persisted when this is returned; the caller
/// only needs to redirect the merchant to `auth_url`.
#[derive(Clone, Debug)]
pub struct InstallRedirect {
    /// The provider authorization URL to redirect the merchant to.
    pub auth_url: String,
    /// The validated shop domain the flow was started for.
    pub shop: ShopDomain,
    /// The state token embedded in the URL, for inspection.
    pub state: StateToken,
}

// Verify InstallRedirect is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InstallRedirect>();
};

/// Request body for the authorization code exchange.
#[derive(serde::Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Successful response from the token endpoint.
#[derive(serde::Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    scope: crate::auth::AuthScopes,
}

/// Initiates the OAuth flow for a shop.
///
/// Validates the shop identifier, generates a fresh state token, persists
/// it keyed by the token with the shop domain as its value, and returns
/// the authorization URL to redirect the merchant to.
///
/// # Errors
///
/// - [`HandshakeError::InvalidShopDomain`] if the identifier does not
///   match the provider domain pattern
/// - [`HandshakeError::MissingHostConfig`] if the gateway host URL needed
///   for the redirect URI is not configured
pub fn begin_install(
    config: &GatewayConfig,
    states: &StateStore,
    shop_param: &str,
    redirect_path: &str,
) -> Result<InstallRedirect, HandshakeError> {
    let shop = config
        .shop_domain(shop_param)
        .map_err(|_| HandshakeError::InvalidShopDomain {
            domain: shop_param.to_string(),
        })?;

    let host = config.host().ok_or(HandshakeError::MissingHostConfig)?;

    let state = StateToken::new();
    states.put(&state, &shop);

    let redirect_uri = format!("{}{}", host.as_ref(), redirect_path);

    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    );

    tracing::info!(shop = shop.as_ref(), "initiated OAuth install");

    Ok(InstallRedirect {
        auth_url,
        shop,
        state,
    })
}

/// Validates an OAuth callback and exchanges the code for an access token.
///
/// The callback is processed in a fixed order:
///
/// 1. Require the `code`, `shop`, `state`, and `hmac` parameters
/// 2. Validate the shop domain against the provider pattern
/// 3. Look up the supplied state token and compare the stored shop domain
///    in constant time. The entry is deleted before the comparison result
///    is known, so a replayed callback always fails.
/// 4. Verify the callback signature (primary key, then old key)
/// 5. Exchange the authorization code at the provider's token endpoint
/// 6. Persist the merchant's installation record (last write wins)
///
/// After persisting, compliance webhooks are registered best-effort; a
/// registration failure is logged but does not fail the handshake.
///
/// No request is sent upstream unless steps 1-4 all pass.
///
/// # Errors
///
/// - [`HandshakeError::MissingParameter`] for an absent or empty parameter
/// - [`HandshakeError::InvalidShopDomain`] for a malformed shop domain
/// - [`HandshakeError::InvalidState`] when no stored token matches
/// - [`HandshakeError::InvalidSignature`] when the signature fails both keys
/// - [`HandshakeError::TokenExchangeFailed`] when the provider rejects the code
/// - [`HandshakeError::UpstreamUnreachable`] on transport errors
pub async fn complete_install(
    config: &GatewayConfig,
    states: &StateStore,
    merchants: &MerchantStore,
    params: &CallbackParams,
) -> Result<MerchantRecord, HandshakeError> {
    let code = require(params.code(), "code")?;
    let shop_raw = require(params.shop(), "shop")?;
    let supplied_state = require(params.state(), "state")?;
    require(params.hmac(), "hmac")?;

    let shop = config
        .shop_domain(shop_raw)
        .map_err(|_| HandshakeError::InvalidShopDomain {
            domain: shop_raw.to_string(),
        })?;

    // Consume-on-lookup: the stored entry is gone after this call
    let stored_domain = states
        .take(supplied_state)
        .ok_or(HandshakeError::InvalidState)?;
    if !constant_time_compare(&stored_domain, shop.as_ref()) {
        return Err(HandshakeError::InvalidState);
    }

    if !verify_authorization_signature(params, config) {
        return Err(HandshakeError::InvalidSignature);
    }

    let token_response = exchange_code(config, &shop, code).await?;

    let record = MerchantRecord {
        shop: shop.as_ref().to_string(),
        access_token: token_response.access_token,
        scopes: token_response.scope,
        installed_at: Utc::now(),
    };
    merchants.put(&record);

    tracing::info!(shop = shop.as_ref(), "completed OAuth install");

    if let Err(error) = register_compliance_webhooks(config, &shop, &record.access_token).await {
        tracing::warn!(shop = shop.as_ref(), %error, "compliance webhook registration failed");
    }

    Ok(record)
}

fn require<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, HandshakeError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(HandshakeError::MissingParameter { name }),
    }
}

async fn exchange_code(
    config: &GatewayConfig,
    shop: &ShopDomain,
    code: &str,
) -> Result<AccessTokenResponse, HandshakeError> {
    let token_url = format!("{}/admin/oauth/access_token", config.upstream_base(shop));

    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let client = reqwest::Client::builder()
        .timeout(config.upstream_timeout())
        .build()
        .map_err(|e| HandshakeError::UpstreamUnreachable {
            message: e.to_string(),
        })?;

    let response = client
        .post(&token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| HandshakeError::UpstreamUnreachable {
            message: e.to_string(),
        })?;

    let status = response.status().as_u16();

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(HandshakeError::TokenExchangeFailed {
            status,
            message: error_body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| HandshakeError::TokenExchangeFailed {
            status,
            message: format!("Failed to parse token response: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn test_config() -> GatewayConfig {
        GatewayConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://gateway.example.com").unwrap())
            .scopes("read_products,write_orders".parse().unwrap())
            .build()
            .unwrap()
    }

    fn stores() -> (StateStore, MerchantStore) {
        let raw: Arc<dyn crate::store::KeyValueStore> = Arc::new(MemoryStore::new());
        (
            StateStore::new(Arc::clone(&raw)),
            MerchantStore::new(raw),
        )
    }

    #[test]
    fn test_begin_install_builds_authorization_url() {
        let config = test_config();
        let (states, _) = stores();

        let redirect = begin_install(&config, &states, "test-shop", "/auth/callback").unwrap();

        assert!(redirect
            .auth_url
            .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
        assert!(redirect.auth_url.contains("client_id=test-api-key"));
        assert!(redirect
            .auth_url
            .contains("redirect_uri=https%3A%2F%2Fgateway.example.com%2Fauth%2Fcallback"));
        assert!(redirect
            .auth_url
            .contains(&format!("state={}", redirect.state.as_ref())));
    }

    #[test]
    fn test_begin_install_persists_state_token() {
        let config = test_config();
        let (states, _) = stores();

        let redirect = begin_install(&config, &states, "test-shop", "/auth/callback").unwrap();

        let stored = states.take(redirect.state.as_ref()).unwrap();
        assert_eq!(stored, "test-shop.myshopify.com");
    }

    #[test]
    fn test_begin_install_rejects_invalid_shop() {
        let config = test_config();
        let (states, _) = stores();

        let result = begin_install(&config, &states, "bad domain!", "/auth/callback");
        assert!(matches!(
            result,
            Err(HandshakeError::InvalidShopDomain { .. })
        ));
    }

    #[test]
    fn test_begin_install_requires_host() {
        let config = GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap();
        let (states, _) = stores();

        let result = begin_install(&config, &states, "test-shop", "/auth/callback");
        assert!(matches!(result, Err(HandshakeError::MissingHostConfig)));
    }

    #[tokio::test]
    async fn test_complete_install_requires_all_parameters() {
        let config = test_config();
        let (states, merchants) = stores();

        let mut params = CallbackParams::new();
        params.insert("shop", "test-shop.myshopify.com");
        params.insert("state", "xyz");
        params.insert("hmac", "deadbeef");

        let result = complete_install(&config, &states, &merchants, &params).await;
        assert!(matches!(
            result,
            Err(HandshakeError::MissingParameter { name: "code" })
        ));
    }

    #[tokio::test]
    async fn test_complete_install_rejects_empty_parameter() {
        let config = test_config();
        let (states, merchants) = stores();

        let mut params = CallbackParams::new();
        params.insert("code", "");
        params.insert("shop", "test-shop.myshopify.com");
        params.insert("state", "xyz");
        params.insert("hmac", "deadbeef");

        let result = complete_install(&config, &states, &merchants, &params).await;
        assert!(matches!(
            result,
            Err(HandshakeError::MissingParameter { name: "code" })
        ));
    }

    #[tokio::test]
    async fn test_complete_install_rejects_unknown_state() {
        let config = test_config();
        let (states, merchants) = stores();

        let mut params = CallbackParams::new();
        params.insert("code", "abc");
        params.insert("shop", "test-shop.myshopify.com");
        params.insert("state", "never-issued");
        params.insert("hmac", "deadbeef");

        let result = complete_install(&config, &states, &merchants, &params).await;
        assert!(matches!(result, Err(HandshakeError::InvalidState)));
    }

    #[tokio::test]
    async fn test_complete_install_consumes_state_on_domain_mismatch() {
        let config = test_config();
        let (states, merchants) = stores();

        let shop = config.shop_domain("test-shop").unwrap();
        states.put(&StateToken::from_raw("the-real-token"), &shop);

        let mut params = CallbackParams::new();
        params.insert("code", "abc");
        params.insert("shop", "other-shop.myshopify.com");
        params.insert("state", "the-real-token");
        params.insert("hmac", "deadbeef");

        let result = complete_install(&config, &states, &merchants, &params).await;
        assert!(matches!(result, Err(HandshakeError::InvalidState)));

        // The stored entry was deleted during the failed attempt
        assert!(states.take("the-real-token").is_none());
    }

    #[tokio::test]
    async fn test_complete_install_rejects_bad_signature_after_state() {
        let config = test_config();
        let (states, merchants) = stores();

        let shop = config.shop_domain("test-shop").unwrap();
        states.put(&StateToken::from_raw("state-token"), &shop);

        let mut params = CallbackParams::new();
        params.insert("code", "abc");
        params.insert("shop", "test-shop.myshopify.com");
        params.insert("state", "state-token");
        params.insert("hmac", "not-a-valid-signature");

        let result = complete_install(&config, &states, &merchants, &params).await;
        assert!(matches!(result, Err(HandshakeError::InvalidSignature)));
    }
}
