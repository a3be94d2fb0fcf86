use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RootError, RootResult};

/// Where policy records are kept.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; everything is lost on exit.
    Memory,
    /// Single-file SQLite database at `store.path`.
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    dirs_or_default(".mayor/policies.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

/// Parameters written into every reveal challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Address of the policy store, as shown to the signer.
    #[serde(default = "default_store_address")]
    pub store_address: String,

    #[serde(default = "default_network_id")]
    pub network_id: u64,

    /// How long one signed challenge authorizes reveals.
    #[serde(default = "default_validity_seconds")]
    pub validity_seconds: u64,
}

fn default_store_address() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

fn default_network_id() -> u64 {
    1
}

fn default_validity_seconds() -> u64 {
    30 * 24 * 60 * 60
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            store_address: default_store_address(),
            network_id: default_network_id(),
            validity_seconds: default_validity_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Fresh ids tried by `publish` before giving up on collisions.
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,
}

fn default_max_id_attempts() -> u32 {
    mayor_store::DEFAULT_MAX_ID_ATTEMPTS
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex-encoded Ed25519 secret key.
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
}

fn default_key_path() -> PathBuf {
    dirs_or_default(".mayor/wallet.key")
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            key_path: default_key_path(),
        }
    }
}

/// Top-level configuration for the mayor binary.
///
/// Loaded from a TOML file (typically `~/.mayor/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub reveal: RevealConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> RootResult<()> {
        if self.reveal.validity_seconds == 0 {
            return Err(RootError::Config("reveal.validity_seconds must be > 0".into()));
        }
        if self.reveal.store_address.trim().is_empty() {
            return Err(RootError::Config(
                "reveal.store_address must not be empty".into(),
            ));
        }
        if self.repository.max_id_attempts == 0 {
            return Err(RootError::Config(
                "repository.max_id_attempts must be > 0".into(),
            ));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.path.as_os_str().is_empty() {
            return Err(RootError::Config(
                "store.path is required for the sqlite backend".into(),
            ));
        }
        Ok(())
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".mayor/config.toml")
    }
}
