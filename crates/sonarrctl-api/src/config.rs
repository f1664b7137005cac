//! `SonarrConfiguration` - connection settings for a Sonarr instance.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Default Sonarr host.
const DEFAULT_HOST: &str = "localhost";

/// Default Sonarr port.
const DEFAULT_PORT: u16 = 8989;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default API version.
const DEFAULT_API_VERSION: &str = "v3";

/// Connection settings for a Sonarr instance.
///
/// Handed to the client once at construction; the client never mutates it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[allow(clippy::module_name_repetitions)]
pub struct SonarrConfiguration {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// API key (Settings > General > Security).
    pub api_key: String,
    /// Use `https` instead of `http`.
    pub use_https: bool,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Path prefix when Sonarr runs behind a reverse proxy (e.g. `/sonarr`).
    pub url_base: String,
    /// API version segment (`v3` or `v5`).
    pub api_version: String,
}

impl Default for SonarrConfiguration {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            api_key: String::new(),
            use_https: false,
            timeout: DEFAULT_TIMEOUT_SECS,
            url_base: String::new(),
            api_version: String::from(DEFAULT_API_VERSION),
        }
    }
}

impl std::fmt::Debug for SonarrConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarrConfiguration")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("use_https", &self.use_https)
            .field("timeout", &self.timeout)
            .field("url_base", &self.url_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl SonarrConfiguration {
    /// Creates a configuration for `host:port` with the given API key.
    /// Remaining fields take their defaults.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Returns `http` or `https`.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_https { "https" } else { "http" }
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Returns the normalized URL base (`/sonarr`), or an empty string.
    #[must_use]
    pub fn normalized_url_base(&self) -> String {
        let trimmed = self.url_base.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Returns `scheme://host:port[/url_base]` without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.host,
            self.port,
            self.normalized_url_base()
        )
    }

    /// Applies `SONARR_*` overrides looked up through `lookup`.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SONARR_PORT`, `SONARR_TIMEOUT` or
    /// `SONARR_USE_HTTPS` cannot be parsed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SONARR_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SONARR_PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid SONARR_PORT: {port}"))?;
        }
        if let Some(api_key) = lookup("SONARR_API_KEY") {
            self.api_key = api_key;
        }
        if let Some(use_https) = lookup("SONARR_USE_HTTPS") {
            self.use_https = parse_bool(&use_https)
                .with_context(|| format!("invalid SONARR_USE_HTTPS: {use_https}"))?;
        }
        if let Some(timeout) = lookup("SONARR_TIMEOUT") {
            self.timeout = timeout
                .trim()
                .parse()
                .with_context(|| format!("invalid SONARR_TIMEOUT: {timeout}"))?;
        }
        if let Some(url_base) = lookup("SONARR_URL_BASE") {
            self.url_base = url_base;
        }
        if let Some(api_version) = lookup("SONARR_API_VERSION") {
            self.api_version = api_version;
        }
        Ok(self)
    }
}

/// Parses the boolean spellings accepted in environment variables.
fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        // Arrange & Act
        let config = SonarrConfiguration::default();

        // Assert
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8989);
        assert_eq!(config.api_key, "");
        assert!(!config.use_https);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.url_base, "");
        assert_eq!(config.api_version, "v3");
    }

    #[test]
    fn test_base_url_https_without_url_base() {
        // Arrange
        let config = SonarrConfiguration {
            use_https: true,
            ..SonarrConfiguration::new("example.com", 443, "key")
        };

        // Act & Assert
        assert_eq!(config.base_url(), "https://example.com:443");
    }

    #[test]
    fn test_base_url_normalizes_url_base() {
        // Arrange
        let mut config = SonarrConfiguration::new("10.0.0.5", 8989, "key");

        for url_base in ["sonarr", "/sonarr", "/sonarr/", "sonarr/"] {
            // Act
            config.url_base = String::from(url_base);

            // Assert
            assert_eq!(config.base_url(), "http://10.0.0.5:8989/sonarr");
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        // Arrange
        let config = SonarrConfiguration::new("localhost", 8989, "super-secret");

        // Act
        let debug = format!("{config:?}");

        // Assert
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_overrides_apply_all_fields() {
        // Arrange
        let lookup = lookup_from(&[
            ("SONARR_HOST", "sonarr.lan"),
            ("SONARR_PORT", "443"),
            ("SONARR_API_KEY", "abc"),
            ("SONARR_USE_HTTPS", "true"),
            ("SONARR_TIMEOUT", "5"),
            ("SONARR_URL_BASE", "/tv"),
            ("SONARR_API_VERSION", "v5"),
        ]);

        // Act
        let config = SonarrConfiguration::default()
            .with_overrides(lookup)
            .unwrap();

        // Assert
        assert_eq!(config.host, "sonarr.lan");
        assert_eq!(config.port, 443);
        assert_eq!(config.api_key, "abc");
        assert!(config.use_https);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.url_base, "/tv");
        assert_eq!(config.api_version, "v5");
    }

    #[test]
    fn test_overrides_missing_keep_values() {
        // Arrange
        let original = SonarrConfiguration::new("keep.me", 1234, "k");

        // Act
        let config = original.clone().with_overrides(|_| None).unwrap();

        // Assert
        assert_eq!(config, original);
    }

    #[test]
    fn test_overrides_invalid_port_fails() {
        // Arrange
        let lookup = lookup_from(&[("SONARR_PORT", "not-a-port")]);

        // Act
        let result = SonarrConfiguration::default().with_overrides(lookup);

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SONARR_PORT"));
    }

    #[test]
    fn test_overrides_invalid_bool_fails() {
        // Arrange
        let lookup = lookup_from(&[("SONARR_USE_HTTPS", "maybe")]);

        // Act
        let result = SonarrConfiguration::default().with_overrides(lookup);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        // Arrange
        let json = r#"{"host":"nas","api_key":"xyz"}"#;

        // Act
        let config: SonarrConfiguration = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(config.host, "nas");
        assert_eq!(config.api_key, "xyz");
        assert_eq!(config.port, 8989);
        assert_eq!(config.api_version, "v3");
    }
}
