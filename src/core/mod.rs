//! Core runtime components of the ingestion pipeline.
//!
//! Data flows: MQTT source → ingestion queue → pump loop →
//! {topic mapper, converter registry} → record sink.

pub mod backoff;
pub mod convert;
pub mod pump;
pub mod queue;
pub mod sink;
pub mod source;
pub mod topic;
pub mod value;
