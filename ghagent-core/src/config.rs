//! Host and token configuration.
//!
//! Configuration is layered: TOML files under the user config directory
//! first, then `GHAGENT_*` environment variables, then the token
//! environment overrides (`GHAGENT_TOKEN`, `GH_TOKEN`). The loaded value
//! exposes the default host and the active token together with where it
//! came from, which the auth gate inspects before any command runs.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

/// The canonical public host. Agent tasks exist nowhere else.
pub const DEFAULT_HOST: &str = "github.com";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the active token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Stored in a hosts file under the config directory.
    ConfigFile,
    /// Stored in the operating system keyring.
    Keyring,
    /// Supplied through an environment variable.
    Environment,
}

impl TokenSource {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "oauth_token" | "config" => Some(TokenSource::ConfigFile),
            "keyring" => Some(TokenSource::Keyring),
            "env" | "environment" => Some(TokenSource::Environment),
            _ => None,
        }
    }
}

/// The token selected for a host, with provenance.
#[derive(Debug, Clone)]
pub struct ActiveToken {
    pub token: String,
    pub source: TokenSource,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HostEntry {
    #[serde(default)]
    oauth_token: Option<String>,
    #[serde(default)]
    token_source: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    default_host: Option<String>,
    #[serde(default)]
    hosts: HashMap<String, HostEntry>,
}

/// Resolved host configuration.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    default_host: String,
    hosts: HashMap<String, (String, TokenSource)>,
}

impl HostConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();
        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("GHAGENT")
                .separator("__")
                .try_parsing(true),
        );

        let raw: RawConfig = builder.build()?.try_deserialize().unwrap_or_default();
        let mut cfg = HostConfig::from_raw(raw)?;

        // A token in the environment always belongs to the default host.
        for var in ["GHAGENT_TOKEN", "GH_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    let host = cfg.default_host.clone();
                    cfg.hosts.insert(host, (token, TokenSource::Environment));
                    break;
                }
            }
        }

        Ok(cfg)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigLoadError> {
        let mut hosts = HashMap::new();
        for (host, entry) in raw.hosts {
            let Some(token) = entry.oauth_token else {
                continue;
            };
            let source = match entry.token_source.as_deref() {
                None => TokenSource::ConfigFile,
                Some(s) => TokenSource::parse(s).ok_or_else(|| ConfigLoadError::InvalidValue {
                    key: format!("hosts.{host}.token_source"),
                    message: format!("unknown token source '{s}'"),
                })?,
            };
            hosts.insert(host, (token, source));
        }

        Ok(Self {
            default_host: raw.default_host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            hosts,
        })
    }

    /// The configured default host, or an empty string when explicitly
    /// cleared.
    pub fn default_host(&self) -> &str {
        &self.default_host
    }

    /// The active token for a host, if any.
    pub fn active_token(&self, host: &str) -> Option<ActiveToken> {
        self.hosts.get(host).map(|(token, source)| ActiveToken {
            token: token.clone(),
            source: *source,
        })
    }

    /// Constructor for a host with no stored token.
    pub fn with_default_host(host: &str) -> Self {
        Self {
            default_host: host.to_string(),
            hosts: HashMap::new(),
        }
    }

    /// Test constructor: a single host carrying one token.
    pub fn with_host_token(host: &str, token: &str, source: TokenSource) -> Self {
        let mut hosts = HashMap::new();
        hosts.insert(host.to_string(), (token.to_string(), source));
        Self {
            default_host: host.to_string(),
            hosts,
        }
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ghagent").join("hosts.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".ghagent").join("hosts.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("ghagent.toml"));
    }

    paths
}

fn load_dotenv_files() {
    if let Ok(cwd) = std::env::current_dir() {
        let _ = dotenvy::from_path(cwd.join(".env"));
    }
}
