//! OpenTelemetry-backed telemetry subsystems
//!
//! This crate holds the shared telemetry core (OTel providers and resource)
//! and the thin Logger/Metrics/Tracer clients that register against it.

pub mod core;
pub mod logger;
pub mod metrics;
pub mod tracer;

pub use crate::core::TelemetryCore;
pub use logger::{LogLevel, Logger};
pub use metrics::Metrics;
pub use tracer::Tracer;
