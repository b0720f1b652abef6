//! Configuration loading and validation for the vault service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::MasterKey;
use crate::error::VaultError;

/// Environment-supplied string that must never appear in `Debug` output.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Redacted(String);

impl Redacted {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Redacted {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Debug for Redacted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Validated vault service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte master key. **Required.**
    #[serde(default)]
    pub master_key: Option<Redacted>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root directory; `uploads/` and `metadata/` live beneath it.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Plaintext size ceiling for a single upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Origin allowed to call the API from a browser.
    #[serde(default = "default_client_url")]
    pub client_url: String,

    /// OTLP endpoint for span export. Export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    5000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}
fn default_client_url() -> String {
    "http://localhost:3000".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed,
    /// including a missing or mis-sized `MASTER_KEY`.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decode the master key.
    ///
    /// # Errors
    ///
    /// [`VaultError::Configuration`] if `MASTER_KEY` is unset or invalid.
    pub fn master_key(&self) -> Result<MasterKey, VaultError> {
        let raw = self
            .master_key
            .as_ref()
            .filter(|k| !k.expose().trim().is_empty())
            .ok_or_else(|| VaultError::Configuration("MASTER_KEY is not set".into()))?;
        MasterKey::from_hex(raw.expose()).map_err(|e| match e {
            VaultError::Configuration(msg) => {
                VaultError::Configuration(format!("MASTER_KEY: {msg}"))
            }
            other => other,
        })
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        self.master_key()?;

        if self.port == 0 {
            anyhow::bail!("PORT must be > 0");
        }
        if self.max_file_size == 0 {
            anyhow::bail!("MAX_FILE_SIZE must be > 0");
        }
        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("DATA_DIR must not be empty");
        }
        if self.client_url.trim().is_empty() {
            anyhow::bail!("CLIENT_URL must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            master_key: Some(Redacted::from("00".repeat(32).as_str())),
            port: default_port(),
            data_dir: default_data_dir(),
            max_file_size: default_max_file_size(),
            client_url: default_client_url(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_port(), 5000);
        assert_eq!(default_data_dir(), PathBuf::from("./data"));
        assert_eq!(default_max_file_size(), 104_857_600);
        assert_eq!(default_client_url(), "http://localhost:3000");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_master_key() {
        let cfg = Config {
            master_key: None,
            ..valid()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("MASTER_KEY"));
    }

    #[test]
    fn validate_rejects_blank_master_key() {
        let cfg = Config {
            master_key: Some(Redacted::from("   ")),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_master_key() {
        let cfg = Config {
            master_key: Some(Redacted::from("ab".repeat(16).as_str())),
            ..valid()
        };
        assert!(matches!(
            cfg.master_key(),
            Err(VaultError::Configuration(_))
        ));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_file_size() {
        let cfg = Config {
            max_file_size: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_output_hides_master_key() {
        let cfg = Config {
            master_key: Some(Redacted::from("deadbeef".repeat(8).as_str())),
            ..valid()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("deadbeef"));
        assert!(dbg.contains("REDACTED"));
    }
}
