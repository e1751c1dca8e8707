//! Client configuration

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::language::Language;

/// Public agent API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.api.ai/v1/";

/// Protocol version sent as the `v` query parameter
pub const CURRENT_API_VERSION: &str = "20150910";

/// Configuration shared by the query and speech clients
///
/// Built once by the caller and handed to clients behind an `Arc`;
/// clients never mutate it.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Client access token sent as bearer credential
    pub access_token: SecretString,

    /// Agent language, applied to every request
    #[serde(default)]
    pub language: Language,

    /// API base URL (default: <https://api.api.ai/v1/>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Protocol version (default: 20150910)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    CURRENT_API_VERSION.to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"[REDACTED]")
            .field("language", &self.language)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration for the public endpoint
    #[must_use]
    pub fn new(access_token: impl Into<String>, language: Language) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            language,
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Point the clients at another base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the protocol version
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Override the request timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Bearer token value
    pub(crate) fn token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Base URL guaranteed to end with `/` so endpoint names can be appended
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.token().trim().is_empty() {
            return Err("Access token is required".to_string());
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Base URL must be an absolute http(s) URL, got {}",
                self.base_url
            ));
        }

        if self.api_version.trim().is_empty() {
            return Err("API version must not be empty".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_has_expected_defaults() {
        let config = ClientConfig::new("token", Language::English);

        assert_eq!(config.token(), "token");
        assert_eq!(config.language, Language::English);
        assert_eq!(config.base_url, "https://api.api.ai/v1/");
        assert_eq!(config.api_version, "20150910");
        assert_eq!(config.timeout_ms, 30000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_fails_without_token() {
        let config = ClientConfig::new("  ", Language::English);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_relative_base_url() {
        let config = ClientConfig::new("token", Language::English).with_base_url("api.ai/v1/");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_zero_timeout() {
        let config = ClientConfig::new("token", Language::English).with_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_empty_version() {
        let config = ClientConfig::new("token", Language::English).with_api_version("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config =
            ClientConfig::new("token", Language::English).with_base_url("http://localhost:8080/v1");
        assert_eq!(config.normalized_base_url(), "http://localhost:8080/v1/");

        let config = config.with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.normalized_base_url(), "http://localhost:8080/v1/");
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = ClientConfig::new("super-secret", Language::German);
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            access_token = "abc123"
            language = "pt-br"
            base_url = "http://localhost:9000/v1"
            timeout_ms = 5000
        "#;

        let config: ClientConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.token(), "abc123");
        assert_eq!(config.language, Language::PortugueseBrazil);
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.api_version, "20150910");
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn config_rejects_unknown_language() {
        let toml = r#"
            access_token = "abc123"
            language = "tlh"
        "#;

        assert!(toml::from_str::<ClientConfig>(toml).is_err());
    }
}
