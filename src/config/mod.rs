//! Configuration types for the gateway.
//!
//! This module provides the core configuration types used to initialize
//! the gateway for OAuth handshakes, credential issuance, and proxied API
//! communication with the upstream provider.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`GatewayConfig`]: The main configuration struct holding all settings
//! - [`GatewayConfigBuilder`]: A builder for constructing [`GatewayConfig`] instances
//! - [`ApiKey`]: A validated API key newtype
//! - [`ApiSecretKey`]: A validated API secret key newtype with masked debug output
//! - [`ShopDomain`]: A validated merchant shop domain
//! - [`HostUrl`]: A validated application host URL
//! - [`ApiVersion`]: The upstream API version to use
//!
//! # Example
//!
//! ```rust
//! use storefront_gateway::{GatewayConfig, ApiKey, ApiSecretKey, ApiVersion};
//!
//! let config = GatewayConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Default provider domain suffix for merchant shops.
pub const DEFAULT_PROVIDER_DOMAIN: &str = "myshopify.com";

/// Default bounded timeout for every outbound upstream call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the gateway.
///
/// This struct holds all settings needed by the handshake controller,
/// credential issuer, API proxy, and webhook handler: API credentials,
/// requested scopes, the provider domain, and outbound-call policy.
///
/// # Thread Safety
///
/// `GatewayConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Key Rotation
///
/// The `old_api_secret_key` field supports seamless key rotation. When
/// verifying authorization or webhook signatures, the gateway tries the
/// primary key first, then falls back to the old key if configured. This
/// allows in-flight OAuth flows and webhook deliveries to complete during
/// key rotation.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::{GatewayConfig, ApiKey, ApiSecretKey, HostUrl};
///
/// let config = GatewayConfig::builder()
///     .api_key(ApiKey::new("your-api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("your-secret").unwrap())
///     .host(HostUrl::new("https://gateway.example.com").unwrap())
///     .provider_domain("example-provider.com")
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.provider_domain(), "example-provider.com");
/// ```
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
    provider_domain: String,
    upstream_host: Option<HostUrl>,
    upstream_timeout: Duration,
    api_version: ApiVersion,
}

impl GatewayConfig {
    /// Creates a new builder for constructing a `GatewayConfig`.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    ///
    /// This is used during key rotation to verify signatures created with
    /// the previous secret key.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the OAuth scopes requested at installation.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the gateway's own host URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the provider domain suffix for merchant shops.
    #[must_use]
    pub fn provider_domain(&self) -> &str {
        &self.provider_domain
    }

    /// Returns the upstream host override, if configured.
    ///
    /// When set, all outbound calls go to this base URL instead of the
    /// per-shop `https://<shop-domain>` origin, with the shop domain sent
    /// in the `Host` header.
    #[must_use]
    pub const fn upstream_host(&self) -> Option<&HostUrl> {
        self.upstream_host.as_ref()
    }

    /// Returns the bounded timeout applied to every outbound upstream call.
    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }

    /// Returns the upstream API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Parses and validates a merchant identifier against this
    /// configuration's provider domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the identifier does
    /// not match `<subdomain>.<provider-domain>`.
    pub fn shop_domain(&self, identifier: impl Into<String>) -> Result<ShopDomain, ConfigError> {
        ShopDomain::parse(identifier, &self.provider_domain)
    }

    /// Returns the base URL for outbound calls concerning the given shop.
    #[must_use]
    pub fn upstream_base(&self, shop: &ShopDomain) -> String {
        self.upstream_host.as_ref().map_or_else(
            || format!("https://{}", shop.as_ref()),
            |host| host.as_ref().trim_end_matches('/').to_string(),
        )
    }
}

// Verify GatewayConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GatewayConfig>();
};

/// Builder for constructing [`GatewayConfig`] instances.
///
/// Required fields are `api_key` and `api_secret_key`. All other fields
/// have sensible defaults.
///
/// # Defaults
///
/// - `provider_domain`: `myshopify.com`
/// - `api_version`: latest stable version
/// - `upstream_timeout`: 10 seconds
/// - `scopes`: empty
/// - `host`, `upstream_host`, `old_api_secret_key`: `None`
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    provider_domain: Option<String>,
    upstream_host: Option<HostUrl>,
    upstream_timeout: Option<Duration>,
    api_version: Option<ApiVersion>,
}

impl GatewayConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    ///
    /// When verifying signatures, the gateway tries the primary secret key
    /// first, then falls back to this old key. This allows in-flight flows
    /// to complete during key rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the OAuth scopes requested at installation.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the gateway's own host URL (required for OAuth redirects and
    /// webhook registration).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the provider domain suffix for merchant shops.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyProviderDomain`] if the domain is empty.
    pub fn provider_domain(mut self, domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into();
        if domain.is_empty() {
            return Err(ConfigError::EmptyProviderDomain);
        }
        self.provider_domain = Some(domain);
        Ok(self)
    }

    /// Sets the upstream host override for outbound calls.
    #[must_use]
    pub fn upstream_host(mut self, host: HostUrl) -> Self {
        self.upstream_host = Some(host);
        self
    }

    /// Sets the bounded timeout for outbound upstream calls.
    #[must_use]
    pub const fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }

    /// Sets the upstream API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Builds the [`GatewayConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        Ok(GatewayConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host: self.host,
            provider_domain: self
                .provider_domain
                .unwrap_or_else(|| DEFAULT_PROVIDER_DOMAIN.to_string()),
            upstream_host: self.upstream_host,
            upstream_timeout: self.upstream_timeout.unwrap_or(DEFAULT_UPSTREAM_TIMEOUT),
            api_version: self.api_version.unwrap_or_else(ApiVersion::latest),
        })
    }
}
