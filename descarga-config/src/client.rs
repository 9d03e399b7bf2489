use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;
use url::Url;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, ENV_BASE_URL, ENV_CONFIG_JSON, ENV_CONFIG_PATH,
    ENV_POLL_INTERVAL, MAX_POLL_INTERVAL_MS,
};
use crate::error::ConfigLoadError;

/// Source that produced the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Connection and polling settings for the download service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the versioned web service; every endpoint path is appended to
    /// it verbatim.
    pub base_url: String,
    /// How long (ms) to wait for a TCP/TLS connection before giving up.
    pub connect_timeout_ms: u64,
    /// Upper bound (ms) for a whole request, including body download. Archive
    /// downloads can be large, so keep this generous.
    pub request_timeout_ms: u64,
    /// Interval (ms) between status sweeps of the background poller. Every
    /// tracked query costs one request per sweep.
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load configuration using environment variables.
    /// Evaluation order:
    /// 1) `$DESCARGA_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$DESCARGA_CONFIG_JSON` (inline JSON),
    /// 3) a default file in the working directory,
    /// 4) defaults if none of the above exist.
    ///
    /// `$DESCARGA_BASE_URL` and `$DESCARGA_POLL_INTERVAL` (humantime, e.g.
    /// `30s`) override whatever was loaded. The result is validated.
    pub fn load_from_env() -> Result<(Self, ClientConfigSource), ConfigLoadError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::load_from_env`] with an injectable variable
    /// lookup.
    pub fn load_with<F>(lookup: F) -> Result<(Self, ClientConfigSource), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (mut config, source) = if let Some(path_str) = non_blank(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            (config, ClientConfigSource::EnvPath(path))
        } else if let Some(raw) = non_blank(ENV_CONFIG_JSON) {
            let parsed = Self::parse_json(&raw)
                .context("failed to parse DESCARGA_CONFIG_JSON")
                .map_err(ConfigLoadError::Parse)?;
            (parsed, ClientConfigSource::EnvInline)
        } else if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            (config, ClientConfigSource::File(path))
        } else {
            (Self::default(), ClientConfigSource::Default)
        };

        if let Some(base_url) = non_blank(ENV_BASE_URL) {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(raw) = non_blank(ENV_POLL_INTERVAL) {
            let interval = humantime::parse_duration(raw.trim()).map_err(|source| {
                ConfigLoadError::InvalidDuration {
                    var: ENV_POLL_INTERVAL,
                    value: raw.clone(),
                    source,
                }
            })?;
            config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        }

        config.validate()?;
        debug!(?source, base_url = %config.base_url, "client configuration loaded");
        Ok((config, source))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::ConfigFileIo {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents)
                .with_context(|| format!("invalid client config {}", path.display())),
            Some("toml") | Some("tml") => toml::from_str(&contents)
                .map_err(|err| anyhow!("invalid client config {}: {}", path.display(), err)),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        };

        parsed.map_err(ConfigLoadError::Parse)
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // Try TOML first, then JSON for convenience.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse client config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("invalid client config json: {err}"))
    }

    /// Check the endpoint parses as an http(s) URL, that every duration is
    /// non-zero and that the poll interval stays within a day.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let url = Url::parse(&self.base_url).map_err(|source| ConfigLoadError::InvalidBaseUrl {
            value: self.base_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigLoadError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }

        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigLoadError::ZeroDuration { field });
            }
        }

        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigLoadError::DurationTooLong {
                field: "poll_interval_ms",
                value: self.poll_interval_ms,
                max_ms: MAX_POLL_INTERVAL_MS,
            });
        }

        Ok(())
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "descarga.toml",
            "descarga.json",
            "config/descarga.toml",
            "config/descarga.json",
        ];

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(|path| path.to_path_buf())
    }
}
