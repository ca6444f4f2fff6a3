//! The pump loop: dequeue, convert, forward.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::convert::{ConvertError, ConverterRegistry};
use super::queue::{IngestQueue, RawEvent};
use super::sink::RecordSink;
use super::topic::{map_topic, measurement_kind};
use super::value::TypedSample;

/// Single consumer of the ingestion queue. Converts each raw event into a
/// typed sample and forwards it as a one-sample record to the sink.
///
/// A reading that fails conversion is logged and dropped; a sink failure is
/// logged and the loop continues with the next event. Neither stops the
/// pump.
pub struct Pump {
    queue: IngestQueue,
    registry: ConverterRegistry,
    series_prefix: String,
    sink: Arc<dyn RecordSink>,
}

impl Pump {
    pub fn new(
        queue: IngestQueue,
        registry: ConverterRegistry,
        series_prefix: String,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            queue,
            registry,
            series_prefix,
            sink,
        }
    }

    /// Runs until the queue closes (all producer handles dropped).
    pub async fn run(mut self) {
        info!(
            converters = self.registry.len(),
            prefix = %self.series_prefix,
            "pump loop started"
        );
        while let Some(event) = self.queue.dequeue().await {
            match self.convert(&event) {
                Ok(sample) => self.forward(sample).await,
                Err(err) => {
                    warn!("dropping reading from '{}': {err}", event.topic);
                }
            }
        }
        info!("ingest queue closed, pump loop finished");
    }

    /// Picks the converter by the topic's final level, parses the payload
    /// and flattens the topic into the sample's series identifier.
    fn convert(&self, event: &RawEvent) -> Result<TypedSample, ConvertError> {
        let kind = measurement_kind(&event.topic);
        let converter = self.registry.lookup(kind);
        let value = converter.parse(&event.payload)?;
        Ok(TypedSample::new(
            map_topic(&event.topic, &self.series_prefix),
            value,
        ))
    }

    /// Forwards one sample as a single-measurement record.
    async fn forward(&self, sample: TypedSample) {
        let device = sample.series_prefix().to_string();
        let measurements = vec![sample.field_name().to_string()];
        let types = vec![sample.tag()];
        let timestamp_ms = sample.timestamp_ms;
        let values = vec![sample.value];

        match self
            .sink
            .insert(&device, timestamp_ms, &measurements, &types, &values)
            .await
        {
            Ok(()) => debug!(
                device = %device,
                measurement = %measurements[0],
                "record forwarded"
            ),
            Err(err) => error!(
                device = %device,
                measurement = %measurements[0],
                "sink rejected record: {err}"
            ),
        }
    }
}
