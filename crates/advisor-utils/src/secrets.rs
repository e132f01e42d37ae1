//! Secret resolution
//!
//! API keys come from one of two places, checked in this order:
//!
//! 1. A hosted secrets file: when the `ADVISOR_SECRETS_FILE` environment
//!    flag is present, that TOML file is parsed into a key/value table and
//!    becomes the only source consulted.
//! 2. The process environment, after a best-effort `.env` load via dotenvy.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Environment flag naming the hosted secrets file
pub const SECRETS_FILE_VAR: &str = "ADVISOR_SECRETS_FILE";

/// Errors raised while loading the secret store
#[derive(Debug, Error)]
pub enum SecretError {
    /// Secrets file could not be read
    #[error("Failed to read secrets file: {0}")]
    Io(#[from] std::io::Error),

    /// Secrets file is not valid TOML
    #[error("Failed to parse secrets file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Source of API keys and other secrets
#[derive(Debug, Clone)]
pub enum SecretStore {
    /// Key/value table loaded from a hosted secrets file
    Hosted(HashMap<String, String>),
    /// Process environment (after an optional `.env` load)
    Env,
}

impl SecretStore {
    /// Build the store from the environment
    ///
    /// Resolution order: the hosted secrets file named by
    /// `ADVISOR_SECRETS_FILE` if that flag is present, otherwise the process
    /// environment with `.env` loaded best-effort.
    pub fn from_env() -> Result<Self, SecretError> {
        if let Ok(path) = std::env::var(SECRETS_FILE_VAR) {
            debug!(path = %path, "Loading hosted secrets file");
            return Self::from_file(path);
        }

        // Missing .env is not an error; keys may live in the environment
        let _ = dotenvy::dotenv();
        Ok(Self::Env)
    }

    /// Load a hosted secrets file
    ///
    /// Only string-valued top-level entries are kept; anything else in the
    /// file is ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SecretError> {
        let contents = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&contents)?;

        let secrets = table
            .into_iter()
            .filter_map(|(key, value)| {
                value.as_str().map(|value| (key, value.to_string()))
            })
            .collect();

        Ok(Self::Hosted(secrets))
    }

    /// Look up a secret by key
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Hosted(secrets) => secrets.get(key).cloned(),
            Self::Env => std::env::var(key).ok(),
        }
    }
}
