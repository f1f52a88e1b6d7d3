//! services/dashboard/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub allowed_origin: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub chat_api_base: String,
    pub evaluation_model: String,
    pub chat_model: String,
    pub evaluation_temperature: f32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Server and storage ---
        let bind_address_str = var_or("BIND_ADDRESS", "127.0.0.1:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let data_dir = PathBuf::from(var_or("DATA_DIR", "./.flareonix"));

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:5173");

        // --- Provider settings ---
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        let gemini_api_base = var_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE);
        let chat_api_base = var_or("CHAT_API_BASE", DEFAULT_CHAT_API_BASE);
        let evaluation_model = var_or("EVALUATION_MODEL", "gemini-3-pro-preview");
        let chat_model = var_or("CHAT_MODEL", "gemini-3-flash-preview");

        let temperature_str = var_or("EVALUATION_TEMPERATURE", "0.7");
        let evaluation_temperature = temperature_str
            .parse::<f32>()
            .ok()
            .filter(|t| (0.0..=2.0).contains(t))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "EVALUATION_TEMPERATURE".to_string(),
                    format!("'{}' is not a temperature between 0 and 2", temperature_str),
                )
            })?;

        Ok(Self {
            bind_address,
            data_dir,
            log_level,
            allowed_origin,
            gemini_api_key,
            gemini_api_base,
            chat_api_base,
            evaluation_model,
            chat_model,
            evaluation_temperature,
        })
    }

    /// The provider key, which the server cannot run without.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:3000");
        assert_eq!(config.evaluation_model, "gemini-3-pro-preview");
        assert_eq!(config.chat_model, "gemini-3-flash-preview");
        assert!((config.evaluation_temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("BIND_ADDRESS", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "BIND_ADDRESS"));

        let err = Config::from_lookup(lookup(&[("EVALUATION_TEMPERATURE", "9")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "EVALUATION_TEMPERATURE"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());

        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "k");
    }
}
