use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use phonesift_core::rules::queues::{DETECT_PHONES_QUEUE, UPDATE_PHONE_OFFER_COUNT_QUEUE};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "phonesift";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_AFTER_SECS: i64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RESERVE_TIMEOUT_SECS: i64 = 90;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Reservations allowed before a job is moved to the failed set.
    pub max_attempts: u32,
    /// Delay before a released job becomes available again.
    pub retry_after_secs: i64,
    pub poll_interval_ms: u64,
    /// A reservation older than this is treated as abandoned and reclaimed.
    pub reserve_timeout_secs: i64,
    /// Queues a worker drains, in priority order.
    pub queues: Vec<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            reserve_timeout_secs: DEFAULT_RESERVE_TIMEOUT_SECS,
            queues: vec![
                DETECT_PHONES_QUEUE.to_string(),
                UPDATE_PHONE_OFFER_COUNT_QUEUE.to_string(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid queue.max_attempts value: {0}")]
    InvalidMaxAttempts(u32),
    #[error("invalid queue.retry_after_secs value: {0}")]
    InvalidRetryAfter(i64),
    #[error("invalid queue.poll_interval_ms value: {0}")]
    InvalidPollInterval(u64),
    #[error("invalid queue.reserve_timeout_secs value: {0}")]
    InvalidReserveTimeout(i64),
    #[error("invalid queue name: {0:?}")]
    InvalidQueueName(String),
    #[error("duplicate queue name: {0}")]
    DuplicateQueueName(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    queue: Option<QueueFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueueFile {
    max_attempts: Option<u32>,
    retry_after_secs: Option<i64>,
    poll_interval_ms: Option<u64>,
    reserve_timeout_secs: Option<i64>,
    queues: Option<Vec<String>>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    let Some(queue) = parsed.queue else {
        return Ok(config);
    };

    if let Some(max_attempts) = queue.max_attempts {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(max_attempts));
        }
        config.queue.max_attempts = max_attempts;
    }

    if let Some(retry_after) = queue.retry_after_secs {
        if retry_after < 0 {
            return Err(ConfigError::InvalidRetryAfter(retry_after));
        }
        config.queue.retry_after_secs = retry_after;
    }

    if let Some(poll_interval) = queue.poll_interval_ms {
        if poll_interval == 0 {
            return Err(ConfigError::InvalidPollInterval(poll_interval));
        }
        config.queue.poll_interval_ms = poll_interval;
    }

    if let Some(reserve_timeout) = queue.reserve_timeout_secs {
        if reserve_timeout < 1 {
            return Err(ConfigError::InvalidReserveTimeout(reserve_timeout));
        }
        config.queue.reserve_timeout_secs = reserve_timeout;
    }

    if let Some(queues) = queue.queues {
        config.queue.queues = validate_queue_names(queues)?;
    }

    Ok(config)
}

/// Trims queue names; only `[A-Za-z0-9_-]` is allowed and duplicates are rejected.
pub fn validate_queue_names(queues: Vec<String>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(queues.len());
    for raw in queues {
        let name = raw.trim();
        if name.is_empty()
            || !name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(ConfigError::InvalidQueueName(raw));
        }
        if names.iter().any(|existing| existing == name) {
            return Err(ConfigError::DuplicateQueueName(name.to_string()));
        }
        names.push(name.to_string());
    }
    if names.is_empty() {
        return Err(ConfigError::InvalidQueueName(String::new()));
    }
    Ok(names)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
