//! Configuration loading and validation.
//!
//! Configuration is read from a TOML file whose path comes from the
//! `IOTPUMP_CONFIG` environment variable, falling back to
//! `/etc/iotpump/config.toml`. A missing file is not an error: every
//! section has working defaults. Validation runs after parsing so a typo
//! fails fast at startup instead of surfacing mid-run.

pub mod convert;
pub mod logger;
pub mod mqtt;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use validator::Validate;

pub use convert::ConvertConfig;
pub use logger::LoggerConfig;
pub use mqtt::MqttConfig;

const CONFIG_PATH_ENV: &str = "IOTPUMP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "/etc/iotpump/config.toml";

/// Timestamp for startup messages printed before the tracing subscriber
/// exists.
pub fn startup_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Startup-phase info message, used before logging is initialized.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        println!(
            "{} {} {}",
            $crate::config::startup_timestamp(),
            console::style("INFO").green(),
            format!($($arg)*)
        )
    };
}

/// Startup-phase warning, used before logging is initialized.
#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        eprintln!(
            "{} {} {}",
            $crate::config::startup_timestamp(),
            console::style("WARN").yellow(),
            format!($($arg)*)
        )
    };
}

/// Startup-phase error, used before logging is initialized.
#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        eprintln!(
            "{} {} {}",
            $crate::config::startup_timestamp(),
            console::style("ERROR").red(),
            format!($($arg)*)
        )
    };
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Root configuration. Every field defaults, so an empty file (or no file
/// at all) yields a runnable configuration except for the mandatory topic
/// list.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub logger: LoggerConfig,
    #[validate(nested)]
    pub mqtt: MqttConfig,
    #[validate(nested)]
    pub series: SeriesConfig,
    pub convert: ConvertConfig,
}

/// Naming of the destination series.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SeriesConfig {
    /// Prefix prepended to every flattened topic, typically the database
    /// path the records land under.
    #[validate(length(min = 1, message = "series prefix must not be empty"))]
    pub prefix: String,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            prefix: "root.devdb".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the resolved path, falling back to
    /// defaults when no file exists, then validates.
    pub fn new() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let config = if path.exists() {
            print_info!("loading configuration from {}", path.display());
            Self::load(&path)?
        } else {
            print_warn!(
                "no configuration file at {}, using defaults",
                path.display()
            );
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// `IOTPUMP_CONFIG` if set, otherwise the system-wide default path.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Parses a configuration file without validating it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
