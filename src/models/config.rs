use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
const DEFAULT_FILES_DIR: &str = "./files";
const DEFAULT_TTL_SECS: u64 = 3600;

/// Optional settings read from the YAML file named by `CONFIG_FILE`.
///
/// The signing key is never read from the file, only from `SIGNING_KEY`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Address the server binds to
    pub bind_addr: Option<String>,

    /// Public URL of the server, used to resolve request targets
    pub base_url: Option<String>,

    /// Directory served under /files
    pub files_dir: Option<PathBuf>,

    /// Default link validity in seconds (0 = never expires)
    pub default_ttl: Option<u64>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Resolved application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub base_url: Url,
    pub files_dir: PathBuf,
    /// Validity of links issued without an explicit expiry; `None` never expires
    pub default_ttl: Option<Duration>,
    key: Arc<[u8]>,
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("CONFIG_FILE") {
            Ok(path) => ConfigFile::read(Path::new(&path))?,
            Err(_) => ConfigFile::default(),
        };

        let config = Self::from_sources(file, |name| std::env::var(name).ok())?;
        tracing::info!(
            bind_addr = %config.bind_addr,
            base_url = %config.base_url,
            files_dir = %config.files_dir.display(),
            default_ttl = ?config.default_ttl.map(|ttl| ttl.num_seconds()),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Merge a config file with environment values; the environment wins.
    pub fn from_sources(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let key = env("SIGNING_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingKey)?;

        let bind_addr = env("BIND_ADDR")
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let raw_base_url = env("BASE_URL")
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_base_url)?;

        let files_dir = env("FILES_DIR")
            .map(PathBuf::from)
            .or(file.files_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILES_DIR));

        let ttl_secs = match env("DEFAULT_TTL") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTtl(raw.clone()))?,
            None => file.default_ttl.unwrap_or(DEFAULT_TTL_SECS),
        };
        let default_ttl = match ttl_secs {
            0 => None,
            secs => Some(
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| ConfigError::InvalidTtl(secs.to_string()))?,
            ),
        };

        Ok(Self {
            bind_addr,
            base_url,
            files_dir,
            default_ttl,
            key: key.into_bytes().into(),
        })
    }

    /// Shared signing key.
    pub fn key(&self) -> Arc<[u8]> {
        self.key.clone()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(invalid("must be an absolute http(s) URL".to_string()));
    }
    Ok(url)
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("base_url", &self.base_url.as_str())
            .field("files_dir", &self.files_dir)
            .field("default_ttl", &self.default_ttl)
            .field("key", &"<redacted>")
            .finish()
    }
}
