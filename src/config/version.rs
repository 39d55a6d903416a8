//! Upstream API version handling.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The upstream API version used when building proxied request paths.
///
/// Versions follow the provider's `YYYY-MM` release naming, with
/// `unstable` accepted for pre-release APIs.
///
/// # Example
///
/// ```rust
/// use storefront_gateway::ApiVersion;
///
/// let version = ApiVersion::new("2025-10").unwrap();
/// assert_eq!(version.as_ref(), "2025-10");
///
/// assert!(ApiVersion::new("october").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Creates a validated API version.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] if the value is neither
    /// `YYYY-MM` nor `unstable`.
    pub fn new(version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        if version == "unstable" || Self::is_release_format(&version) {
            Ok(Self(version))
        } else {
            Err(ConfigError::InvalidApiVersion { version })
        }
    }

    /// Returns the latest stable version this crate was built against.
    #[must_use]
    pub fn latest() -> Self {
        Self("2025-10".to_string())
    }

    fn is_release_format(version: &str) -> bool {
        let bytes = version.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return false;
        }
        let year_ok = bytes[..4].iter().all(u8::is_ascii_digit);
        let month_ok = bytes[5..].iter().all(u8::is_ascii_digit);
        if !year_ok || !month_ok {
            return false;
        }
        matches!(&version[5..], "01" | "04" | "07" | "10")
    }
}

impl AsRef<str> for ApiVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_quarterly_releases() {
        assert!(ApiVersion::new("2024-01").is_ok());
        assert!(ApiVersion::new("2024-04").is_ok());
        assert!(ApiVersion::new("2025-07").is_ok());
        assert!(ApiVersion::new("2025-10").is_ok());
    }

    #[test]
    fn test_accepts_unstable() {
        assert!(ApiVersion::new("unstable").is_ok());
    }

    #[test]
    fn test_rejects_malformed_versions() {
        assert!(ApiVersion::new("").is_err());
        assert!(ApiVersion::new("2025").is_err());
        assert!(ApiVersion::new("2025-13").is_err());
        assert!(ApiVersion::new("2025-02").is_err());
        assert!(ApiVersion::new("25-10").is_err());
        assert!(ApiVersion::new("latest").is_err());
    }

    #[test]
    fn test_latest_is_valid() {
        let latest = ApiVersion::latest();
        assert!(ApiVersion::new(latest.as_ref()).is_ok());
    }

    #[test]
    fn test_display_matches_as_ref() {
        let version = ApiVersion::new("2025-10").unwrap();
        assert_eq!(version.to_string(), version.as_ref());
    }
}
