//! Client credential issuance for browser extension access.
//!
//! After a merchant installs the gateway, the extension obtains an opaque
//! client key tied to the shop's stored access token. The key is the only
//! secret the extension ever holds; the provider access token never leaves
//! the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::state::random_token;
use crate::config::ShopDomain;
use crate::store::{KeyValueStore, MerchantStore};

/// Length of generated client keys. 32 alphanumeric characters carry more
/// than 128 bits of entropy.
pub const CLIENT_KEY_LENGTH: usize = 32;

/// How long an issued credential stays valid.
pub const CREDENTIAL_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// An issued client credential.
///
/// Binds an opaque client key to a shop and the access token captured at
/// issuance time. Both secrets are masked in `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCredential {
    /// The opaque key handed to the extension.
    pub client_key: String,
    /// The shop this credential acts for.
    pub shop: String,
    /// The provider access token the proxy will use for this credential.
    pub access_token: String,
    /// When the credential was issued.
    pub issued_at: DateTime<Utc>,
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("client_key", &"*****")
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Typed store for [`ClientCredential`]s, keyed by client key.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    /// Wraps a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(client_key: &str) -> String {
        format!("credential:{client_key}")
    }

    /// Returns the credential for a client key, or `None` if it was never
    /// issued or has expired.
    #[must_use]
    pub fn get(&self, client_key: &str) -> Option<ClientCredential> {
        let raw = self.store.get(&Self::key(client_key))?;
        match serde_json::from_str(&raw) {
            Ok(credential) => Some(credential),
            Err(error) => {
                tracing::warn!(%error, "discarding corrupt client credential");
                None
            }
        }
    }

    /// Stores a credential with the standard TTL.
    pub fn put(&self, credential: &ClientCredential) {
        match serde_json::to_string(credential) {
            Ok(json) => self.store.put(
                &Self::key(&credential.client_key),
                json,
                Some(CREDENTIAL_TTL),
            ),
            Err(error) => {
                tracing::error!(shop = credential.shop, %error, "failed to serialize credential");
            }
        }
    }

    /// Revokes a credential.
    pub fn delete(&self, client_key: &str) {
        self.store.delete(&Self::key(client_key));
    }
}

/// Outcome of a credential request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A fresh credential was issued.
    Issued(ClientCredential),
    /// The shop has no installation record; the merchant must complete
    /// the OAuth flow first.
    NotInstalled,
}

/// Issues a client credential for a shop.
///
/// Looks up the shop's installation record; if present, generates a fresh
/// opaque client key, captures the shop's current access token, and stores
/// the credential with a 90-day TTL. Each call issues a new key; earlier
/// keys stay valid until they expire.
///
/// Returns [`IssueOutcome::NotInstalled`] when the shop has no record, so
/// callers can distinguish "run the OAuth flow first" from an error.
#[must_use]
pub fn issue_credential(
    merchants: &MerchantStore,
    credentials: &CredentialStore,
    shop: &ShopDomain,
) -> IssueOutcome {
    let Some(record) = merchants.get(shop) else {
        tracing::debug!(shop = shop.as_ref(), "credential requested for uninstalled shop");
        return IssueOutcome::NotInstalled;
    };

    let credential = ClientCredential {
        client_key: random_token(CLIENT_KEY_LENGTH),
        shop: record.shop,
        access_token: record.access_token,
        issued_at: Utc::now(),
    };
    credentials.put(&credential);

    tracing::info!(shop = shop.as_ref(), "issued client credential");

    IssueOutcome::Issued(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MerchantRecord};

    fn shop(domain: &str) -> ShopDomain {
        ShopDomain::parse(domain, "myshopify.com").unwrap()
    }

    fn installed_stores(shop_domain: &str) -> (MerchantStore, CredentialStore) {
        let raw: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let merchants = MerchantStore::new(Arc::clone(&raw));
        merchants.put(&MerchantRecord {
            shop: shop_domain.to_string(),
            access_token: "shpat_token".to_string(),
            scopes: "read_products".parse().unwrap(),
            installed_at: Utc::now(),
        });
        (merchants, CredentialStore::new(raw))
    }

    #[test]
    fn test_issue_credential_for_installed_shop() {
        let (merchants, credentials) = installed_stores("test-shop.myshopify.com");

        let outcome = issue_credential(&merchants, &credentials, &shop("test-shop.myshopify.com"));

        let IssueOutcome::Issued(credential) = outcome else {
            panic!("expected an issued credential");
        };
        assert_eq!(credential.client_key.len(), CLIENT_KEY_LENGTH);
        assert!(credential
            .client_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(credential.shop, "test-shop.myshopify.com");
        assert_eq!(credential.access_token, "shpat_token");

        // Retrievable by key afterwards
        assert_eq!(credentials.get(&credential.client_key), Some(credential));
    }

    #[test]
    fn test_issue_credential_for_uninstalled_shop() {
        let raw: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let merchants = MerchantStore::new(Arc::clone(&raw));
        let credentials = CredentialStore::new(raw);

        let outcome = issue_credential(&merchants, &credentials, &shop("ghost.myshopify.com"));
        assert_eq!(outcome, IssueOutcome::NotInstalled);
    }

    #[test]
    fn test_repeat_issuance_generates_distinct_keys() {
        let (merchants, credentials) = installed_stores("test-shop.myshopify.com");
        let shop = shop("test-shop.myshopify.com");

        let first = issue_credential(&merchants, &credentials, &shop);
        let second = issue_credential(&merchants, &credentials, &shop);

        let (IssueOutcome::Issued(first), IssueOutcome::Issued(second)) = (first, second) else {
            panic!("expected both issuances to succeed");
        };
        assert_ne!(first.client_key, second.client_key);

        // Both keys remain valid
        assert!(credentials.get(&first.client_key).is_some());
        assert!(credentials.get(&second.client_key).is_some());
    }

    #[test]
    fn test_unknown_client_key_lookup() {
        let (_, credentials) = installed_stores("test-shop.myshopify.com");
        assert!(credentials.get("no-such-key").is_none());
    }

    #[test]
    fn test_credential_debug_masks_secrets() {
        let credential = ClientCredential {
            client_key: "super-secret-client-key".to_string(),
            shop: "test-shop.myshopify.com".to_string(),
            access_token: "shpat_token".to_string(),
            issued_at: Utc::now(),
        };

        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret-client-key"));
        assert!(!debug.contains("shpat_token"));
        assert!(debug.contains("test-shop.myshopify.com"));
    }
}
