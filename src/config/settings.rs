//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::middleware::cors::CorsOrigins;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// A credential that must never show up in logs or serialized output
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw value, for building an auth header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Per-provider credentials and endpoint overrides
///
/// A missing key is not a startup error: requests for that provider fail
/// with an upstream error instead.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(skip_serializing)]
    pub openai_api_key: Option<Secret>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<Secret>,
    #[serde(skip_serializing)]
    pub deepseek_api_key: Option<Secret>,

    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub deepseek_base_url: Option<String>,
}

impl ProviderSettings {
    fn from_env() -> Self {
        Self {
            openai_api_key: env_secret("OPENAI_API_KEY"),
            anthropic_api_key: env_secret("ANTHROPIC_API_KEY"),
            deepseek_api_key: env_secret("DEEPSEEK_API_KEY"),
            openai_base_url: env_non_empty("OPENAI_BASE_URL"),
            anthropic_base_url: env_non_empty("ANTHROPIC_BASE_URL"),
            deepseek_base_url: env_non_empty("DEEPSEEK_BASE_URL"),
        }
    }

    /// Names of the credential variables that are not set
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.anthropic_api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.deepseek_api_key.is_none() {
            missing.push("DEEPSEEK_API_KEY");
        }
        missing
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    /// `*`, one origin, or a comma-separated allow-list
    pub cors_allow_origin: String,

    /// Upper bound on a single upstream call, connect through body
    pub upstream_timeout_seconds: u64,

    pub providers: ProviderSettings,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "llm-chat-dispatch"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            cors_allow_origin: env_or_default("CORS_ALLOW_ORIGIN", "*"),
            upstream_timeout_seconds: env_or_default("UPSTREAM_TIMEOUT_SECONDS", "10")
                .parse()
                .context("Invalid UPSTREAM_TIMEOUT_SECONDS value")?,

            providers: ProviderSettings::from_env(),
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.upstream_timeout_seconds == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECONDS must be > 0");
        }

        self.cors_origins()?;

        let missing = self.providers.missing_keys();
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Some provider credentials are not configured; requests to those providers will fail"
            );
        }

        Ok(())
    }

    /// The parsed CORS origin policy
    pub fn cors_origins(&self) -> Result<CorsOrigins> {
        CorsOrigins::parse(&self.cors_allow_origin)
    }

    pub fn upstream_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upstream_timeout_seconds)
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "llm-chat-dispatch".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allow_origin: "*".to_string(),
            upstream_timeout_seconds: 10,
            providers: ProviderSettings::default(),
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secret(key: &str) -> Option<Secret> {
    env_non_empty(key).map(Secret::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "llm-chat-dispatch");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.cors_allow_origin, "*");
        assert_eq!(settings.upstream_timeout_seconds, 10);
        assert_eq!(settings.cors_origins().unwrap(), CorsOrigins::Any);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let settings = Settings {
            upstream_timeout_seconds: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let settings = Settings {
            cors_allow_origin: "https://example.com\n".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_origin_list() {
        let settings = Settings {
            cors_allow_origin: "https://somefar.com, http://localhost:3000".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
        assert!(settings.cors_origins().unwrap().varies_by_origin());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let settings = Settings {
            providers: ProviderSettings {
                openai_api_key: Some(Secret::new("sk-very-secret")),
                ..ProviderSettings::default()
            },
            ..Settings::default()
        };

        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));

        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-very-secret"));
    }

    #[test]
    fn test_missing_keys() {
        let providers = ProviderSettings {
            anthropic_api_key: Some(Secret::new("key")),
            ..ProviderSettings::default()
        };
        assert_eq!(providers.missing_keys(), vec!["OPENAI_API_KEY", "DEEPSEEK_API_KEY"]);
    }
}
