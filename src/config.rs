use std::fmt::{self, Display};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connector::{DEFAULT_READ_TIMEOUT, DEFAULT_SOCKET};
use crate::key_pattern::KeyPattern;
use crate::parser::EventFilter;
use crate::reader::{DEFAULT_CHUNK_SIZE, DEFAULT_IDLE_RETRY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config file {} must not be world-writable", .0.display())]
    WorldWritable(PathBuf),
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse: {}: contains invalid UTF-8 sequences", .0.display())]
    Utf8(PathBuf),
    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Input {
    pub socket: PathBuf,
    /// Upper bound for a single receive, in seconds
    #[serde(rename = "read-timeout")]
    pub read_timeout: u64,
    /// Pause after an idle receive, in milliseconds
    #[serde(rename = "idle-retry")]
    pub idle_retry: u64,
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            socket: DEFAULT_SOCKET.into(),
            read_timeout: DEFAULT_READ_TIMEOUT.as_secs(),
            idle_retry: DEFAULT_IDLE_RETRY.as_millis() as u64,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Filter {
    #[serde(rename = "event-type")]
    pub event_type: String,
    #[serde(rename = "key-pattern")]
    pub key_pattern: KeyPattern,
}

impl Default for Filter {
    fn default() -> Self {
        let f = EventFilter::default();
        Filter {
            event_type: f.event_type,
            key_pattern: f.key_pattern,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Output {
    pub waiting: bool,
    #[serde(rename = "dump-fields")]
    pub dump_fields: bool,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            waiting: true,
            dump_fields: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Debug {
    #[serde(rename = "log-level")]
    pub log_level: log::LevelFilter,
}

impl Default for Debug {
    fn default() -> Self {
        Debug {
            log_level: log::LevelFilter::Info,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: Input,
    pub filter: Filter,
    pub output: Output,
    pub debug: Debug,
}

impl Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = toml::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s.trim_end().replace('\n', "; "))
    }
}

impl Config {
    /// Reads configuration from a TOML file. The file must not be
    /// world-writable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mode = fs::metadata(path)
            .map_err(|source| ConfigError::Stat {
                path: path.into(),
                source,
            })?
            .permissions()
            .mode();
        if mode & 0o002 != 0 {
            return Err(ConfigError::WorldWritable(path.into()));
        }
        let buf = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.into(),
            source,
        })?;
        let text = String::from_utf8(buf).map_err(|_| ConfigError::Utf8(path.into()))?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.read_timeout == 0 {
            return Err(ConfigError::Invalid("input.read-timeout", "must be > 0".into()));
        }
        if self.input.chunk_size == 0 {
            return Err(ConfigError::Invalid("input.chunk-size", "must be > 0".into()));
        }
        if self.filter.event_type.is_empty() {
            return Err(ConfigError::Invalid("filter.event-type", "must not be empty".into()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.input.read_timeout)
    }

    pub fn idle_retry(&self) -> Duration {
        Duration::from_millis(self.input.idle_retry)
    }

    pub fn make_filter(&self) -> EventFilter {
        EventFilter::new(&self.filter.event_type, self.filter.key_pattern.clone())
    }
}
