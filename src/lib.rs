//! # Storefront Gateway
//!
//! An OAuth authentication gateway between a browser extension and a
//! merchant storefront API: it runs the authorization code flow, issues
//! opaque client credentials, and forwards signed requests upstream so
//! that provider access tokens never leave the server.
//!
//! ## Overview
//!
//! The gateway provides:
//! - Type-safe configuration via [`GatewayConfig`] and [`GatewayConfigBuilder`]
//! - Validated newtypes for API credentials and domain values
//! - The OAuth 2.0 authorization code flow via [`auth::handshake`]
//! - HMAC-SHA256 signature verification with key rotation via [`auth::signature`]
//! - Single-use CSRF state tokens via [`auth::state`]
//! - Opaque client credential issuance via [`credentials`]
//! - Authenticated request forwarding via [`proxy`]
//! - Compliance webhook verification, dispatch, and registration via [`webhooks`]
//! - A pluggable key-value persistence contract via [`store`]
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_gateway::{GatewayConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = GatewayConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://gateway.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## OAuth Handshake
//!
//! ```rust,ignore
//! use storefront_gateway::{begin_install, complete_install, CallbackParams};
//!
//! // Install request: persist a state token and redirect the merchant
//! let redirect = begin_install(&config, &states, "example-shop", "/auth/callback")?;
//! // ... HTTP 302 to redirect.auth_url ...
//!
//! // Callback: validate, exchange the code, persist the merchant record
//! let params = CallbackParams::from_query(request_query);
//! let record = complete_install(&config, &states, &merchants, &params).await?;
//! ```
//!
//! ## Credential Issuance and Proxying
//!
//! ```rust,ignore
//! use storefront_gateway::{issue_credential, ApiProxy, IssueOutcome, ProxyRequest, HttpMethod};
//!
//! // The extension asks for a credential after the merchant installed
//! let IssueOutcome::Issued(credential) = issue_credential(&merchants, &credentials, &shop)
//! else {
//!     // Tell the extension to run the install flow first
//!     return;
//! };
//!
//! // Later, forward requests on the credential's behalf
//! let proxy = ApiProxy::new(config, credential_store);
//! let response = proxy
//!     .forward(&credential.client_key, &ProxyRequest {
//!         endpoint: "/products.json".to_string(),
//!         method: HttpMethod::Get,
//!         data: None,
//!     })
//!     .await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Fail-closed verification**: Signature and state checks happen before
//!   any upstream call
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod proxy;
pub mod store;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{
    begin_install, complete_install, AuthScopes, CallbackParams, HandshakeError, InstallRedirect,
    StateToken, STATE_TTL,
};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, GatewayConfig, GatewayConfigBuilder, HostUrl, ShopDomain,
};
pub use credentials::{
    issue_credential, ClientCredential, CredentialStore, IssueOutcome, CLIENT_KEY_LENGTH,
    CREDENTIAL_TTL,
};
pub use error::{ConfigError, ErrorBody, ErrorKind};
pub use proxy::{ApiProxy, HttpMethod, ProxyError, ProxyRequest, ProxyResponse};
pub use store::{KeyValueStore, MemoryStore, MerchantRecord, MerchantStore, StateStore};
pub use webhooks::{
    handle_webhook, register_compliance_webhooks, verify_webhook, ComplianceTopic, WebhookError,
    WebhookRequest,
};
