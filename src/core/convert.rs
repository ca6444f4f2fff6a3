//! Value converters and the converter registry.
//!
//! Each measurement kind (the final level of an MQTT topic, e.g.
//! "temperature") is mapped to a converter that turns the textual payload
//! into a typed [`Value`]. Kinds without an explicit registration fall back
//! to the adaptive [`Converter::DoubleOrText`], so lookup never fails.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::value::{TypeTag, Value};
use crate::config::convert::ConvertConfig;

/// A payload that does not match the grammar of the selected converter.
/// Recoverable: the pump drops the single reading and keeps running.
#[derive(Debug, Error)]
#[error("unable to parse {raw:?} as {target}")]
pub struct ConvertError {
    pub raw: String,
    pub target: TypeTag,
}

impl ConvertError {
    fn new(raw: &str, target: TypeTag) -> Self {
        Self {
            raw: raw.to_string(),
            target,
        }
    }
}

/// The closed family of value converters, one parse rule per variant.
///
/// Modeled as an enum rather than trait objects: the variant set is fixed
/// and the sink boundary matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// `yes`/`true`/`1` and `no`/`false`/`0`, case-insensitive, trimmed.
    Bool,
    /// Parses as f64 first, then rounds half-away-from-zero to an i32,
    /// so "1.00", "1.01" and "0.99" all produce 1.
    Int32,
    Float32,
    Float64,
    /// Always succeeds; wraps the raw payload verbatim, untrimmed.
    Text,
    /// Adaptive: Float64 when the payload parses as one, Text otherwise.
    /// The reported tag varies per call — read it from each returned
    /// [`Value`], never cache it per series.
    DoubleOrText,
}

impl Converter {
    pub fn parse(&self, raw: &str) -> Result<Value, ConvertError> {
        match self {
            Converter::Bool => match raw.trim().to_lowercase().as_str() {
                "yes" | "true" | "1" => Ok(Value::Bool(true)),
                "no" | "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(ConvertError::new(raw, TypeTag::Bool)),
            },
            Converter::Int32 => raw
                .trim()
                .parse::<f64>()
                .map(|f| Value::Int32(f.round() as i32))
                .map_err(|_| ConvertError::new(raw, TypeTag::Int32)),
            Converter::Float32 => raw
                .trim()
                .parse::<f32>()
                .map(Value::Float32)
                .map_err(|_| ConvertError::new(raw, TypeTag::Float32)),
            Converter::Float64 => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| ConvertError::new(raw, TypeTag::Float64)),
            Converter::Text => Ok(Value::Text(raw.to_string())),
            Converter::DoubleOrText => Ok(match raw.trim().parse::<f64>() {
                Ok(f) => Value::Float64(f),
                Err(_) => Value::Text(raw.to_string()),
            }),
        }
    }
}

/// Case-insensitive measurement-kind → converter table.
///
/// Populated once at startup from the built-in defaults and configuration
/// overrides, read-only while the pump loop runs.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    table: HashMap<String, Converter>,
    fallback: Converter,
}

impl ConverterRegistry {
    /// An empty registry with the adaptive fallback only.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
            fallback: Converter::DoubleOrText,
        }
    }

    /// The built-in mapping for the sensor kinds the bridge was written for.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in [
            "temperature",
            "humidity",
            "co2",
            "voc",
            "nox",
            "pm1",
            "pm2.5",
            "pm4",
            "pm10",
            "lux",
        ] {
            registry.register(kind, Converter::Float32);
        }
        registry.register("presence", Converter::Int32);
        registry.register("button", Converter::Int32);
        registry
    }

    /// Registers a single kind. Keys are case-folded; a later registration
    /// for the same kind overwrites the earlier one.
    pub fn register(&mut self, kind: &str, converter: Converter) {
        self.table.insert(kind.trim().to_lowercase(), converter);
    }

    /// Registers every kind in a comma-separated list, as configuration
    /// files supply them.
    pub fn register_all(&mut self, kinds: &str, converter: Converter) {
        for kind in kinds.split(',') {
            let kind = kind.trim();
            if !kind.is_empty() {
                self.register(kind, converter);
            }
        }
    }

    /// Merges configured overrides over the current table.
    pub fn apply_overrides(&mut self, cfg: &ConvertConfig) {
        let overrides = [
            (&cfg.float32, Converter::Float32),
            (&cfg.float64, Converter::Float64),
            (&cfg.int32, Converter::Int32),
            (&cfg.text, Converter::Text),
            (&cfg.bool, Converter::Bool),
        ];
        for (kinds, converter) in overrides {
            if let Some(kinds) = kinds {
                debug!("registering {:?} as {:?}", kinds, converter);
                self.register_all(kinds, converter);
            }
        }
    }

    /// Looks up the converter for a measurement kind, case-insensitively.
    /// Total: unknown kinds get the adaptive fallback.
    pub fn lookup(&self, kind: &str) -> Converter {
        self.table
            .get(&kind.to_lowercase())
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Number of explicitly registered kinds (the fallback not included).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
