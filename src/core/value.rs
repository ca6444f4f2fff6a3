//! Typed values and samples flowing towards the time-series sink.

use std::fmt;

use time::OffsetDateTime;

/// The closed set of runtime representations a stored value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int32,
    Float32,
    Float64,
    Text,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Bool => "Bool",
            TypeTag::Int32 => "Int32",
            TypeTag::Float32 => "Float32",
            TypeTag::Float64 => "Float64",
            TypeTag::Text => "Text",
        };
        write!(f, "{name}")
    }
}

/// A typed value. The variant is the type tag, so a `Float64` can never
/// carry text and the tag/representation invariant holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    Text(String),
}

impl Value {
    /// The tag describing this value's representation.
    ///
    /// For values produced by the adaptive converter this must be read per
    /// value, never cached: the same converter can report different tags
    /// on consecutive calls.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int32(_) => TypeTag::Int32,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::Text(_) => TypeTag::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Current wall-clock time as integer milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// One converted reading, addressed by its flattened series identifier.
///
/// Constructed by the pump loop, handed to the sink, then discarded —
/// samples are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSample {
    /// Full series identifier; its last segment is the field name and
    /// everything before it is the series prefix (device path).
    pub series: String,
    pub value: Value,
    pub timestamp_ms: i64,
}

impl TypedSample {
    /// Creates a sample timestamped with the current wall-clock time.
    pub fn new(series: impl Into<String>, value: Value) -> Self {
        Self::with_timestamp(series, value, now_millis())
    }

    pub fn with_timestamp(series: impl Into<String>, value: Value, timestamp_ms: i64) -> Self {
        Self {
            series: series.into(),
            value,
            timestamp_ms,
        }
    }

    /// Substring after the last `.` — the field (measurement) name.
    pub fn field_name(&self) -> &str {
        match self.series.rfind('.') {
            Some(idx) => &self.series[idx + 1..],
            None => &self.series,
        }
    }

    /// Substring before the last `.` — the series prefix the sink treats as
    /// the device path. Empty when the identifier has no separator; the
    /// topic mapper always introduces at least one as long as the configured
    /// prefix is non-empty.
    pub fn series_prefix(&self) -> &str {
        match self.series.rfind('.') {
            Some(idx) => &self.series[..idx],
            None => "",
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.value.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_tag_matches_variant() {
        assert_eq!(Value::Bool(true).tag(), TypeTag::Bool);
        assert_eq!(Value::Int32(1).tag(), TypeTag::Int32);
        assert_eq!(Value::Float32(1.3).tag(), TypeTag::Float32);
        assert_eq!(Value::Float64(1.3).tag(), TypeTag::Float64);
        assert_eq!(Value::Text("text".into()).tag(), TypeTag::Text);
    }

    #[test]
    fn test_sample_field_name() {
        let sample = TypedSample::with_timestamp(
            "root.somewhere.src1.temperature",
            Value::Text("ignore".into()),
            0,
        );
        assert_eq!(sample.field_name(), "temperature");
    }

    #[test]
    fn test_sample_series_prefix() {
        let sample = TypedSample::with_timestamp(
            "root.somewhere.src1.temperature",
            Value::Text("ignore".into()),
            0,
        );
        assert_eq!(sample.series_prefix(), "root.somewhere.src1");
    }

    #[test]
    fn test_sample_without_separator() {
        let sample = TypedSample::with_timestamp("flat", Value::Int32(1), 0);
        assert_eq!(sample.field_name(), "flat");
        assert_eq!(sample.series_prefix(), "");
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = now_millis();
        let sample = TypedSample::new("a.b", Value::Float32(1.0));
        let after = now_millis();
        assert!(sample.timestamp_ms >= before && sample.timestamp_ms <= after);
    }
}
