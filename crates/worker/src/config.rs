use std::path::PathBuf;
use std::str::FromStr;

use lapse_pipeline::collaborators::DEFAULT_THUMBNAIL_SIZE;
use lapse_pipeline::submitter::{SubmitterConfig, DEFAULT_IMAGE};

/// Worker configuration loaded from environment variables.
///
/// | Env Var              | Default                   |
/// |----------------------|---------------------------|
/// | `DATABASE_URL`       | unset: in-memory store    |
/// | `ENGINE_API_URL`     | `http://localhost:8080`   |
/// | `ENGINE_WS_URL`      | `ws://localhost:8080`     |
/// | `CONTAINER_IMAGE`    | `photomorph:latest`       |
/// | `PULL_IMAGE`         | `false`                   |
/// | `ASSETSTORE_ROOT`    | `./assetstore`            |
/// | `THUMBNAIL_SIZE`     | `128`                     |
/// | `EVENT_BUS_CAPACITY` | `1024`                    |
/// | `LOG_FORMAT`         | `text` (or `json`)        |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: Option<String>,
    pub engine_api_url: String,
    pub engine_ws_url: String,
    pub container_image: String,
    pub pull_image: bool,
    pub assetstore_root: PathBuf,
    pub thumbnail_size: u32,
    pub event_bus_capacity: usize,
    pub json_logs: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let thumbnail_size = parse_or(&get, "THUMBNAIL_SIZE", DEFAULT_THUMBNAIL_SIZE)?;
        if thumbnail_size == 0 {
            return Err(invalid("THUMBNAIL_SIZE", "0", "must be positive"));
        }
        let event_bus_capacity = parse_or(&get, "EVENT_BUS_CAPACITY", 1024usize)?;
        if event_bus_capacity == 0 {
            return Err(invalid("EVENT_BUS_CAPACITY", "0", "must be positive"));
        }

        Ok(Self {
            database_url: get("DATABASE_URL"),
            engine_api_url: get("ENGINE_API_URL")
                .unwrap_or_else(|| "http://localhost:8080".into()),
            engine_ws_url: get("ENGINE_WS_URL").unwrap_or_else(|| "ws://localhost:8080".into()),
            container_image: get("CONTAINER_IMAGE").unwrap_or_else(|| DEFAULT_IMAGE.into()),
            pull_image: parse_or(&get, "PULL_IMAGE", false)?,
            assetstore_root: get("ASSETSTORE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./assetstore")),
            thumbnail_size,
            event_bus_capacity,
            json_logs: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Submission settings with the default result streams.
    pub fn submitter_config(&self) -> SubmitterConfig {
        SubmitterConfig {
            image: self.container_image.clone(),
            pull_image: self.pull_image,
            ..Default::default()
        }
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}
