//! Runtime configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by `dotenvy` in `main`). Every setting has a default, so an empty
//! environment yields a working local server.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Server and provider settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub max_upload_bytes: usize,
    /// `None` means provider calls may block indefinitely.
    pub provider_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            provider_timeout: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup("FILE_ANALYZER_BIND") {
            config.bind = bind
                .parse()
                .with_context(|| format!("Invalid FILE_ANALYZER_BIND: {}", bind))?;
        }

        if let Some(url) = lookup("OPENAI_BASE_URL") {
            config.openai_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            config.anthropic_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(mb) = lookup("MAX_UPLOAD_MB") {
            let mb: usize = mb
                .parse()
                .with_context(|| format!("Invalid MAX_UPLOAD_MB: {}", mb))?;
            config.max_upload_bytes = mb * 1024 * 1024;
        }

        if let Some(secs) = lookup("PROVIDER_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid PROVIDER_TIMEOUT_SECS: {}", secs))?;
            config.provider_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Shared HTTP client for both completion providers.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.provider_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().context("Failed to build HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.openai_base_url, "https://api.openai.com");
        assert_eq!(config.anthropic_base_url, "https://api.anthropic.com");
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert!(config.provider_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FILE_ANALYZER_BIND", "127.0.0.1:8080"),
            ("OPENAI_BASE_URL", "http://localhost:9000/"),
            ("MAX_UPLOAD_MB", "5"),
            ("PROVIDER_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.openai_base_url, "http://localhost:9000");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.provider_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("MAX_UPLOAD_MB", "lots")])).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_MB"));
    }
}
