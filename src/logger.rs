//! Centralized logging initialization.
//!
//! Builds a `tracing` subscriber from [`LoggerConfig`]: an `EnvFilter`
//! seeded with the configured level (overridable via `RUST_LOG`) plus a
//! console layer in one of three formats.

use thiserror::Error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};
use validator::Validate;

use crate::config::logger::{LogFormat, LoggerConfig};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid logger configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("no log layers configured")]
    NoLayersConfigured,

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

pub struct LoggerManager {
    config: LoggerConfig,
}

impl LoggerManager {
    pub fn new(config: &LoggerConfig) -> Result<Self, LoggerError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Installs the global subscriber. Call once, early in startup.
    pub fn init(&self) -> Result<(), LoggerError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let layers = self.build_layers()?;
        tracing_subscriber::registry().with(layers).with(filter).try_init()?;
        Ok(())
    }

    fn build_layers(&self) -> Result<Vec<Box<dyn Layer<Registry> + Send + Sync>>, LoggerError> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        let console = &self.config.console;
        if console.enabled {
            let span_events = if console.show_spans {
                FmtSpan::NEW | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            let base = fmt::layer()
                .with_target(console.show_target)
                .with_thread_ids(console.show_thread_ids)
                .with_ansi(console.ansi_colors)
                .with_span_events(span_events);

            let layer = match console.format {
                LogFormat::Compact => base.compact().boxed(),
                LogFormat::Pretty => base.pretty().boxed(),
                LogFormat::Json => base.json().boxed(),
            };
            layers.push(layer);
        }

        if layers.is_empty() {
            return Err(LoggerError::NoLayersConfigured);
        }
        Ok(layers)
    }
}
