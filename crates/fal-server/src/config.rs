use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use fal_types::Role;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server configuration, loadable from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Record store journal file.
    pub journal_path: PathBuf,
    /// Refuse to start if a persisted transaction fails its own hash.
    pub strict_replay: bool,
    /// Fsync the journal after every write.
    pub sync_writes: bool,
    pub max_body_bytes: usize,
    /// Static bearer tokens accepted by the built-in auth provider.
    pub tokens: Vec<TokenGrant>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            journal_path: PathBuf::from("fal-data/records.journal"),
            strict_replay: false,
            sync_writes: false,
            max_body_bytes: 10 * 1024 * 1024,
            tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}

/// A bearer token and the identity it resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub actor_id: String,
    pub name: String,
    pub role: Role,
}
