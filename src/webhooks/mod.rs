//! Webhook verification, dispatch, and registration.
//!
//! # Modules
//!
//! - [`verification`]: raw-body signature verification and [`WebhookRequest`]
//! - [`dispatch`]: compliance topic routing and handlers
//! - [`register`]: registering the compliance topics after install
//! - [`error`]: webhook error types

pub mod dispatch;
pub mod error;
pub mod register;
pub mod verification;

pub use dispatch::{handle_webhook, ComplianceTopic};
pub use error::WebhookError;
pub use register::{register_compliance_webhooks, WEBHOOK_PATH};
pub use verification::{
    verify_webhook, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
};
