//! The record-sink boundary towards the time-series store.

use async_trait::async_trait;
use tracing::info;

use super::value::{TypeTag, Value};

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for converted records.
///
/// One call per reading: a device path plus parallel slices of measurement
/// names, type tags and values (single-element today, the shape allows
/// batching later). Implementations report failure through the returned
/// error; the pump logs it and moves on, retries are the sink's business.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert(
        &self,
        device: &str,
        timestamp_ms: i64,
        measurements: &[String],
        types: &[TypeTag],
        values: &[Value],
    ) -> Result<(), SinkError>;
}

/// Sink that writes records to the log instead of a database. Useful for
/// dry runs against a live broker.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl RecordSink for LogSink {
    async fn insert(
        &self,
        device: &str,
        timestamp_ms: i64,
        measurements: &[String],
        types: &[TypeTag],
        values: &[Value],
    ) -> Result<(), SinkError> {
        for ((measurement, tag), value) in measurements.iter().zip(types).zip(values) {
            info!(
                device,
                %measurement,
                %tag,
                %value,
                timestamp_ms,
                "record"
            );
        }
        Ok(())
    }
}
