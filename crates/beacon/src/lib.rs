//! Process-wide observability facade
//!
//! One handle over logging, metrics, tracing, optional continuous profiling,
//! and optional binary telemetry recording. Subsystems start in a fixed
//! dependency order and shut down in reverse, with failure-tolerant
//! teardown. Most applications use [`with_session`]; long-lived services
//! hold a [`Beacon`] and call [`Beacon::shutdown`] themselves.
//!
//! ```no_run
//! use beacon::{with_session, BeaconConfig, ServiceIdentity};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let identity = ServiceIdentity::new("ingest-api")?.with_version("1.4.0");
//! let config = BeaconConfig::from_env()?;
//!
//! with_session(&identity, &config, |beacon| {
//!     Box::pin(async move {
//!         beacon.logger().info("service starting");
//!         beacon.metrics().record_u64("startups", 1, &[]);
//!         Ok(())
//!     })
//! })
//! .await
//! # }
//! ```

pub mod orchestrator;
pub mod session;
pub mod subsystem;

pub use orchestrator::Beacon;
pub use session::{with_session, ScopeFuture};
pub use subsystem::{ProfilerHandle, RecorderHandle, TelemetryHandle};

pub use beacon_core::{
    BeaconConfig, BeaconError, Compression, Environment, OtlpConfig, ProfilingConfig,
    RecordingConfig, ServiceIdentity, TelemetryConfig,
};
pub use beacon_infra::{ProfileSample, Profiler, Recorder};
pub use beacon_telemetry::{LogLevel, Logger, Metrics, TelemetryCore, Tracer};
