//! Persistence for merchant records, pending states, and credentials.
//!
//! All gateway state lives behind the [`KeyValueStore`] trait: a string
//! key-value contract with optional expiry. The bundled [`MemoryStore`]
//! backs tests and single-process deployments; production deployments
//! implement the trait over their own store.
//!
//! Typed wrappers ([`MerchantStore`], [`StateStore`]) own a key namespace
//! each and handle JSON serialization, so the rest of the crate never
//! touches raw keys.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::auth::state::{StateToken, STATE_TTL};
use crate::auth::AuthScopes;
use crate::config::ShopDomain;

/// Abstract key-value store with optional per-entry expiry.
///
/// Implementations must make an expired entry indistinguishable from a
/// deleted one: once the TTL passes, `get` returns `None`. Writes are
/// last-write-wins; the gateway never requires transactions.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any existing entry. When
    /// `ttl` is set the entry expires after that duration.
    fn put(&self, key: &str, value: String, ttl: Option<Duration>);

    /// Removes the entry for `key`, if any.
    fn delete(&self, key: &str);
}

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory [`KeyValueStore`] backed by a mutex-guarded map.
///
/// Expiry is enforced on read: an expired entry is removed and reported
/// as absent. Suitable for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|expires_at| expires_at <= Utc::now());
        if expired {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| {
            ChronoDuration::from_std(ttl)
                .ok()
                .map(|ttl| Utc::now() + ttl)
        });

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), Entry { value, expires_at });
    }

    fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

/// A merchant's installation record.
///
/// Created when an OAuth handshake completes and deleted when the shop
/// uninstalls. The access token is masked in `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerchantRecord {
    /// The shop's full domain.
    pub shop: String,
    /// The offline access token obtained from the token exchange.
    pub access_token: String,
    /// The scopes actually granted by the merchant.
    pub scopes: AuthScopes,
    /// When the handshake completed.
    pub installed_at: DateTime<Utc>,
}

impl fmt::Debug for MerchantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantRecord")
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("scopes", &self.scopes)
            .field("installed_at", &self.installed_at)
            .finish()
    }
}

/// Typed store for [`MerchantRecord`]s, keyed by shop domain.
#[derive(Clone)]
pub struct MerchantStore {
    store: Arc<dyn KeyValueStore>,
}

impl MerchantStore {
    /// Wraps a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(shop: &str) -> String {
        format!("merchant:{shop}")
    }

    /// Returns the installation record for a shop, if any.
    ///
    /// A record that fails to deserialize is treated as absent and logged.
    #[must_use]
    pub fn get(&self, shop: &ShopDomain) -> Option<MerchantRecord> {
        let raw = self.store.get(&Self::key(shop.as_ref()))?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(shop = shop.as_ref(), %error, "discarding corrupt merchant record");
                None
            }
        }
    }

    /// Stores an installation record, replacing any existing one.
    pub fn put(&self, record: &MerchantRecord) {
        match serde_json::to_string(record) {
            Ok(json) => self.store.put(&Self::key(&record.shop), json, None),
            Err(error) => {
                tracing::error!(shop = record.shop, %error, "failed to serialize merchant record");
            }
        }
    }

    /// Deletes a shop's installation record.
    pub fn delete(&self, shop: &ShopDomain) {
        self.store.delete(&Self::key(shop.as_ref()));
    }
}

/// Typed store for pending OAuth states, keyed by state token.
///
/// Each entry maps a state token to the shop domain it was issued for.
/// Entries are single-use: [`take`](Self::take) deletes the entry before
/// returning it, so a second callback with the same token finds nothing.
#[derive(Clone)]
pub struct StateStore {
    store: Arc<dyn KeyValueStore>,
}

impl StateStore {
    /// Wraps a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(token: &str) -> String {
        format!("state:{token}")
    }

    /// Stores a pending state entry with the standard TTL.
    ///
    /// Tokens are unique per flow, so concurrent installs for the same
    /// shop each get their own entry.
    pub fn put(&self, state: &StateToken, shop: &ShopDomain) {
        self.store.put(
            &Self::key(state.as_ref()),
            shop.as_ref().to_string(),
            Some(STATE_TTL),
        );
    }

    /// Removes and returns the shop domain a state token was issued for.
    ///
    /// The deletion happens unconditionally, so the token cannot be
    /// replayed whether or not the caller's domain comparison succeeds.
    #[must_use]
    pub fn take(&self, state: &str) -> Option<String> {
        let key = Self::key(state);
        let stored = self.store.get(&key);
        self.store.delete(&key);
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_put_delete() {
        let store = MemoryStore::new();

        assert_eq!(store.get("k"), None);
        store.put("k", "v".to_string(), None);
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.put("k", "v2".to_string(), None);
        assert_eq!(store.get("k"), Some("v2".to_string()));

        store.delete("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_memory_store_expires_entries() {
        let store = MemoryStore::new();
        store.put("k", "v".to_string(), Some(Duration::ZERO));

        // TTL of zero is already in the past
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_memory_store_long_ttl_still_readable() {
        let store = MemoryStore::new();
        store.put("k", "v".to_string(), Some(Duration::from_secs(600)));
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    fn shop(domain: &str) -> ShopDomain {
        ShopDomain::parse(domain, "myshopify.com").unwrap()
    }

    fn record(shop: &str) -> MerchantRecord {
        MerchantRecord {
            shop: shop.to_string(),
            access_token: "shpat_test_token".to_string(),
            scopes: "read_products".parse().unwrap(),
            installed_at: Utc::now(),
        }
    }

    #[test]
    fn test_merchant_store_round_trips_records() {
        let merchants = MerchantStore::new(Arc::new(MemoryStore::new()));
        let shop = shop("test-shop.myshopify.com");

        assert!(merchants.get(&shop).is_none());

        let record = record("test-shop.myshopify.com");
        merchants.put(&record);
        assert_eq!(merchants.get(&shop), Some(record));

        merchants.delete(&shop);
        assert!(merchants.get(&shop).is_none());
    }

    #[test]
    fn test_merchant_store_treats_corrupt_record_as_absent() {
        let raw = Arc::new(MemoryStore::new());
        raw.put("merchant:test-shop.myshopify.com", "not json".to_string(), None);

        let merchants = MerchantStore::new(raw);
        assert!(merchants.get(&shop("test-shop.myshopify.com")).is_none());
    }

    #[test]
    fn test_merchant_record_debug_masks_token() {
        let debug = format!("{:?}", record("test-shop.myshopify.com"));
        assert!(!debug.contains("shpat_test_token"));
        assert!(debug.contains("*****"));
    }

    #[test]
    fn test_state_store_take_is_single_use() {
        let states = StateStore::new(Arc::new(MemoryStore::new()));
        let shop = shop("test-shop.myshopify.com");
        let state = StateToken::new();

        states.put(&state, &shop);
        assert_eq!(
            states.take(state.as_ref()),
            Some("test-shop.myshopify.com".to_string())
        );

        // Second take finds nothing
        assert_eq!(states.take(state.as_ref()), None);
    }

    #[test]
    fn test_state_store_concurrent_flows_coexist() {
        let states = StateStore::new(Arc::new(MemoryStore::new()));
        let shop = shop("test-shop.myshopify.com");

        let first = StateToken::new();
        let second = StateToken::new();
        states.put(&first, &shop);
        states.put(&second, &shop);

        assert!(states.take(first.as_ref()).is_some());
        assert!(states.take(second.as_ref()).is_some());
    }

    #[test]
    fn test_stores_are_namespaced() {
        let raw: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let merchants = MerchantStore::new(Arc::clone(&raw));
        let states = StateStore::new(Arc::clone(&raw));

        let shop = shop("test-shop.myshopify.com");
        merchants.put(&record("test-shop.myshopify.com"));
        states.put(&StateToken::from_raw("abc"), &shop);

        assert!(raw.get("merchant:test-shop.myshopify.com").is_some());
        assert!(raw.get("state:abc").is_some());

        // Consuming the state leaves the merchant record intact
        let _ = states.take("abc");
        assert!(merchants.get(&shop).is_some());
    }
}
