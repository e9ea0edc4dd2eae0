//! Configuration read from the process environment.

use crate::error::Result;
use crate::image::providers::{GeminiModel, DEFAULT_BASE_URL};
use std::env;

/// Environment variables searched for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];
/// Environment variable selecting the model.
pub const MODEL_ENV_VAR: &str = "EMBRACE_MODEL";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV_VAR: &str = "EMBRACE_BASE_URL";

/// Returns the first non-blank API key found through `lookup`, trimmed.
pub(crate) fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Runtime configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// API key; absence is reported when generation is attempted.
    pub api_key: Option<String>,
    /// Model to call.
    pub model: GeminiModel,
    /// API base URL.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    /// Creates a configuration with defaults and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(&lookup);

        let model = match lookup(MODEL_ENV_VAR) {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => GeminiModel::default(),
        };

        let base_url = lookup(BASE_URL_ENV_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            model,
            base_url,
        })
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbraceError;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.api_key.is_none());
        assert_eq!(config.model, GeminiModel::NanoBanana);
    }

    #[test]
    fn test_api_key_precedence() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "google"),
            ("API_KEY", "primary"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config =
            Config::from_lookup(lookup(&[("API_KEY", "  "), ("GEMINI_API_KEY", "gemini")]))
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gemini"));

        let config =
            Config::from_lookup(lookup(&[("API_KEY", ""), ("GOOGLE_API_KEY", "real-key")]))
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("real-key"));
    }

    #[test]
    fn test_model_and_base_url() {
        let config = Config::from_lookup(lookup(&[
            (MODEL_ENV_VAR, "nano-banana-pro"),
            (BASE_URL_ENV_VAR, "http://localhost:8080/"),
        ]))
        .unwrap();
        assert_eq!(config.model, GeminiModel::NanoBananaPro);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = Config::from_lookup(lookup(&[(MODEL_ENV_VAR, "dall-e-3")])).unwrap_err();
        assert!(matches!(err, EmbraceError::InvalidRequest(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::new().with_api_key("secret-value");
        assert!(!format!("{config:?}").contains("secret-value"));
    }
}
