//! OAuth callback query parameters.
//!
//! Provides [`CallbackParams`], the parsed query parameters of an OAuth
//! authorization callback, with the canonical signable form used for
//! signature verification.

use std::collections::BTreeMap;

/// The query parameters of an OAuth authorization callback.
///
/// Parameters are stored sorted by key so that
/// [`to_signable_string`](Self::to_signable_string) yields the canonical
/// message the provider signed: every parameter except `hmac` and
/// `signature`, joined as `key=value` pairs with `&`.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::auth::CallbackParams;
///
/// let params = CallbackParams::from_query(
///     "code=abc&shop=test.myshopify.com&state=xyz&hmac=deadbeef",
/// );
/// assert_eq!(params.code(), Some("abc"));
/// assert_eq!(
///     params.to_signable_string(),
///     "code=abc&shop=test.myshopify.com&state=xyz"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    params: BTreeMap<String, String>,
}

impl CallbackParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string into callback parameters.
    ///
    /// Keys and values are percent-decoded. Malformed pairs (no `=`) are
    /// treated as a key with an empty value, and pairs whose encoding
    /// cannot be decoded are kept verbatim so signature verification can
    /// still reject them.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = BTreeMap::new();

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key).map_or_else(|_| key.to_string(), Into::into);
            let value = urlencoding::decode(value).map_or_else(|_| value.to_string(), Into::into);
            params.insert(key, value);
        }

        Self { params }
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    /// Returns the value of a parameter, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the authorization code, if present.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// Returns the shop domain, if present.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// Returns the state token, if present.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Returns the received signature, if present.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get("hmac")
    }

    /// Returns the canonical message covered by the callback signature.
    ///
    /// All parameters except `hmac` and the legacy `signature` parameter,
    /// sorted lexicographically by key and joined as `key=value` pairs
    /// with `&`.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        self.params
            .iter()
            .filter(|(key, _)| key.as_str() != "hmac" && key.as_str() != "signature")
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_parses_and_decodes() {
        let params = CallbackParams::from_query(
            "code=abc123&shop=test-shop.myshopify.com&state=xyz&hmac=deadbeef&host=aG9zdA%3D%3D",
        );

        assert_eq!(params.code(), Some("abc123"));
        assert_eq!(params.shop(), Some("test-shop.myshopify.com"));
        assert_eq!(params.state(), Some("xyz"));
        assert_eq!(params.hmac(), Some("deadbeef"));
        assert_eq!(params.get("host"), Some("aG9zdA=="));
    }

    #[test]
    fn test_from_query_handles_empty_and_bare_pairs() {
        let params = CallbackParams::from_query("a=1&&flag&b=2");

        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.get("flag"), Some(""));
    }

    #[test]
    fn test_signable_string_excludes_signature_params() {
        let mut params = CallbackParams::new();
        params.insert("shop", "test.myshopify.com");
        params.insert("code", "abc");
        params.insert("hmac", "deadbeef");
        params.insert("signature", "legacy");
        params.insert("state", "xyz");

        assert_eq!(
            params.to_signable_string(),
            "code=abc&shop=test.myshopify.com&state=xyz"
        );
    }

    #[test]
    fn test_signable_string_sorts_keys() {
        let mut params = CallbackParams::new();
        params.insert("timestamp", "1234567890");
        params.insert("code", "abc");
        params.insert("shop", "test.myshopify.com");

        assert_eq!(
            params.to_signable_string(),
            "code=abc&shop=test.myshopify.com&timestamp=1234567890"
        );
    }
}
