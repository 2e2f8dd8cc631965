//! Centralized configuration for admin-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than in the middle of a command.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Where the partnership slot lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// Process-local slot; every run starts from the seed data
    Memory,
    /// Single JSON file on disk
    File,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::File
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: file)
    pub storage_provider: StorageProvider,
    /// Slot file location (default: ./data/partnerships.json)
    pub store_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage provider
        let storage_provider = StorageProvider::from_str(
            &lookup("PARTNERSHIPS_STORAGE").unwrap_or_else(|| "file".into()),
        );

        // Slot path
        let store_path = match lookup("PARTNERSHIPS_PATH") {
            Some(p) if p.trim().is_empty() => {
                return Err(ConfigError {
                    field: "PARTNERSHIPS_PATH",
                    message: "must not be empty".into(),
                });
            }
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(file_slot::DEFAULT_PATH),
        };

        // Log format
        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            storage_provider,
            store_path,
            log_format,
        })
    }

    /// Log a warning when changes will not outlive the process.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "PARTNERSHIPS_STORAGE=memory: changes are kept in memory only and \
                 are lost when the command exits."
            );
        }
    }
}
