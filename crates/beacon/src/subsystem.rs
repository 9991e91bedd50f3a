//! Capability traits for the teardown-bearing subsystems
//!
//! The orchestrator owns its collaborators through these seams so that
//! shutdown behavior can be exercised with fakes simulating selective
//! failure. Logger, Metrics, and Tracer carry no top-level teardown; their
//! lifecycle is subordinate to the telemetry core's.

use async_trait::async_trait;

use beacon_core::BeaconError;
use beacon_infra::{ProfileSample, Profiler, Recorder};
use beacon_telemetry::TelemetryCore;

/// The shared telemetry core: owns the export plumbing for logs, metrics,
/// and traces, and flushes all three on shutdown.
#[async_trait]
pub trait TelemetryHandle: Send + Sync {
    async fn shutdown(&mut self) -> Result<(), BeaconError>;
}

/// A running continuous profiler.
#[async_trait]
pub trait ProfilerHandle: Send + Sync {
    async fn stop(&mut self) -> Result<(), BeaconError>;

    fn latest_sample(&self) -> Option<ProfileSample>;
}

/// An open telemetry-log recording.
#[async_trait]
pub trait RecorderHandle: Send + Sync {
    fn record(&self, topic: &str, payload: serde_json::Value) -> Result<(), BeaconError>;

    async fn close(&mut self) -> Result<(), BeaconError>;
}

#[async_trait]
impl TelemetryHandle for TelemetryCore {
    async fn shutdown(&mut self) -> Result<(), BeaconError> {
        TelemetryCore::shutdown(self)
    }
}

#[async_trait]
impl ProfilerHandle for Profiler {
    async fn stop(&mut self) -> Result<(), BeaconError> {
        Profiler::stop(self).await
    }

    fn latest_sample(&self) -> Option<ProfileSample> {
        Profiler::latest_sample(self)
    }
}

#[async_trait]
impl RecorderHandle for Recorder {
    fn record(&self, topic: &str, payload: serde_json::Value) -> Result<(), BeaconError> {
        Recorder::record(self, topic, payload)
    }

    async fn close(&mut self) -> Result<(), BeaconError> {
        Recorder::close(self)
    }
}
