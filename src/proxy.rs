//! Authenticated request forwarding to the storefront API.
//!
//! The [`ApiProxy`] resolves a client key to its stored credential,
//! attaches the shop's access token, and relays the request to the
//! upstream API. The extension never sees the access token; the upstream
//! status and body are passed back verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::config::{GatewayConfig, ShopDomain};
use crate::credentials::CredentialStore;
use crate::error::ErrorKind;

/// HTTP methods the proxy will forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// A request from the extension to forward upstream.
#[derive(Clone, Debug, Deserialize)]
pub struct ProxyRequest {
    /// The upstream endpoint path, e.g. `/products.json`.
    pub endpoint: String,
    /// The HTTP method to use upstream.
    pub method: HttpMethod,
    /// Optional JSON body, sent only for `POST` and `PUT`.
    #[serde(default)]
    pub data: Option<Value>,
}

/// The upstream response, relayed verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyResponse {
    /// The upstream HTTP status code.
    pub status: u16,
    /// The upstream response body parsed as JSON.
    pub body: Value,
}

impl ProxyResponse {
    /// Returns `true` if the upstream status was 2xx.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors produced by the proxy itself.
///
/// Upstream HTTP error statuses are not errors here; they are relayed in
/// the [`ProxyResponse`].
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No stored credential matched the presented client key.
    #[error("Unknown or expired client key")]
    UnknownClientKey,

    /// The request named no endpoint to forward to.
    #[error("Endpoint must not be empty")]
    EmptyEndpoint,

    /// The upstream API could not be reached.
    #[error("Upstream unreachable: {message}")]
    UpstreamUnreachable {
        /// The underlying transport error.
        message: String,
    },
}

impl ProxyError {
    /// Returns the error classification for HTTP mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownClientKey => ErrorKind::Authentication,
            Self::EmptyEndpoint => ErrorKind::Validation,
            Self::UpstreamUnreachable { .. } => ErrorKind::Upstream,
        }
    }
}

/// Forwards authenticated requests to the storefront API.
///
/// # Thread Safety
///
/// `ApiProxy` is `Send + Sync`, making it safe to share across async tasks.
pub struct ApiProxy {
    config: GatewayConfig,
    credentials: CredentialStore,
    client: reqwest::Client,
}

// Verify ApiProxy is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiProxy>();
};

impl ApiProxy {
    /// Creates a proxy over the given configuration and credential store.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: GatewayConfig, credentials: CredentialStore) -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.upstream_timeout())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            credentials,
            client,
        }
    }

    /// Forwards a request on behalf of the credential holder.
    ///
    /// The client key is resolved before anything is sent upstream; an
    /// unknown or expired key means no upstream call at all. The upstream
    /// status and body are relayed whether or not the status is 2xx.
    ///
    /// # Errors
    ///
    /// - [`ProxyError::UnknownClientKey`] when the key resolves to nothing
    /// - [`ProxyError::EmptyEndpoint`] when the endpoint is blank
    /// - [`ProxyError::UpstreamUnreachable`] on transport failure or timeout
    pub async fn forward(
        &self,
        client_key: &str,
        request: &ProxyRequest,
    ) -> Result<ProxyResponse, ProxyError> {
        let credential = self
            .credentials
            .get(client_key)
            .ok_or(ProxyError::UnknownClientKey)?;

        let endpoint = request.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ProxyError::EmptyEndpoint);
        }

        let shop = self
            .config
            .shop_domain(&credential.shop)
            .map_err(|_| ProxyError::UnknownClientKey)?;

        let url = self.build_url(&shop, endpoint);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        req_builder = req_builder
            .header("Accept", "application/json")
            .header("X-Shopify-Access-Token", &credential.access_token);

        // Keep routing by shop when all traffic goes to a fixed upstream host
        if self.config.upstream_host().is_some() {
            req_builder = req_builder.header("Host", shop.as_ref());
        }

        if matches!(request.method, HttpMethod::Post | HttpMethod::Put) {
            if let Some(data) = &request.data {
                req_builder = req_builder.json(data);
            }
        }

        tracing::debug!(
            shop = shop.as_ref(),
            method = %request.method,
            endpoint,
            "forwarding request upstream"
        );

        let response = req_builder
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable {
                message: e.to_string(),
            })?;
        let body = if body_text.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
        };

        Ok(ProxyResponse { status, body })
    }

    fn build_url(&self, shop: &ShopDomain, endpoint: &str) -> String {
        let base = self.config.upstream_base(shop);
        let version = self.config.api_version();
        if endpoint.starts_with('/') {
            format!("{base}/api/{version}{endpoint}")
        } else {
            format!("{base}/api/{version}/{endpoint}")
        }
    }
}
