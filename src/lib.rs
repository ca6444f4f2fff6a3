//! iotpump — MQTT to time-series bridge
//!
//! This crate subscribes to hierarchical MQTT topics carrying textual sensor
//! readings, converts each reading into a typed value, flattens the topic
//! into a dot-separated series identifier, and forwards one-sample records
//! to a pluggable time-series sink.
//!
//! ## Modules
//!
//! * `config` — Configuration structures, loading, validation, and defaults.
//!   Supports TOML configuration files with validation via the `validator`
//!   crate.
//!
//! * `core` — The ingestion pipeline:
//!   - Typed values and samples
//!   - Value converters and the converter registry
//!   - Topic-to-series mapping
//!   - The ingestion queue between transport callbacks and the pump loop
//!   - The MQTT source and the record-sink boundary
//!
//! * `logger` — Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON).

pub mod config;
pub mod core;
pub mod logger;
