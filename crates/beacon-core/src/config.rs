//! Configuration module
//!
//! This module provides the configuration tree consumed by the Beacon
//! orchestrator: per-subsystem sub-configs with documented defaults. The
//! tree is pure data; every numeric field is accepted unchecked and each
//! subsystem's `enabled` flag is read exactly once, when the orchestrator
//! is created.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::BeaconError;

const DEFAULT_GRPC_ENDPOINT: &str = "http://localhost:4317";
const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:4318";
const DEFAULT_OTLP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_METRICS_INTERVAL_SECS: u64 = 30;
const DEFAULT_SAMPLE_RATIO: f64 = 1.0;
const DEFAULT_PROFILE_INTERVAL_MS: u64 = 1000;
const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Top-level Beacon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub profiling: ProfilingConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl BeaconConfig {
    /// Load configuration from `BEACON_*` environment variables, falling back
    /// to defaults for anything unset. A `.env` file is honored if present.
    pub fn from_env() -> Result<Self, BeaconError> {
        dotenvy::dotenv().ok();

        let mut config = BeaconConfig::default();

        if let Ok(v) = env::var("BEACON_OTLP_GRPC_ENDPOINT") {
            config.telemetry.otlp.grpc_endpoint = v;
        }
        if let Ok(v) = env::var("BEACON_OTLP_HTTP_ENDPOINT") {
            config.telemetry.otlp.http_endpoint = v;
        }
        if let Ok(v) = env::var("BEACON_OTLP_USE_GRPC") {
            config.telemetry.otlp.use_grpc = parse_flag("BEACON_OTLP_USE_GRPC", &v)?;
        }
        if let Ok(v) = env::var("BEACON_OTLP_TIMEOUT_SECS") {
            config.telemetry.otlp.timeout_secs = parse_number("BEACON_OTLP_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = env::var("BEACON_EXPORT_ENABLED") {
            config.telemetry.export_enabled = parse_flag("BEACON_EXPORT_ENABLED", &v)?;
        }
        if let Ok(v) = env::var("BEACON_ENABLE_LOGGING") {
            config.telemetry.enable_logging = parse_flag("BEACON_ENABLE_LOGGING", &v)?;
        }
        if let Ok(v) = env::var("BEACON_ENABLE_METRICS") {
            config.telemetry.enable_metrics = parse_flag("BEACON_ENABLE_METRICS", &v)?;
        }
        if let Ok(v) = env::var("BEACON_ENABLE_TRACING") {
            config.telemetry.enable_tracing = parse_flag("BEACON_ENABLE_TRACING", &v)?;
        }
        if let Ok(v) = env::var("BEACON_METRICS_INTERVAL_SECS") {
            config.telemetry.metrics_interval_secs =
                parse_number("BEACON_METRICS_INTERVAL_SECS", &v)?;
        }
        if let Ok(v) = env::var("BEACON_SAMPLE_RATIO") {
            config.telemetry.sample_ratio = v.parse::<f64>().map_err(|_| {
                BeaconError::Validation("BEACON_SAMPLE_RATIO must be a valid number".to_string())
            })?;
        }

        if let Ok(v) = env::var("BEACON_PROFILING_ENABLED") {
            config.profiling.enabled = parse_flag("BEACON_PROFILING_ENABLED", &v)?;
        }
        if let Ok(v) = env::var("BEACON_PROFILING_INTERVAL_MS") {
            config.profiling.sample_interval_ms =
                parse_number("BEACON_PROFILING_INTERVAL_MS", &v)?;
        }

        if let Ok(v) = env::var("BEACON_RECORDING_ENABLED") {
            config.recording.enabled = parse_flag("BEACON_RECORDING_ENABLED", &v)?;
        }
        if let Ok(v) = env::var("BEACON_RECORDING_PATH") {
            config.recording.path = v;
        }
        if let Ok(v) = env::var("BEACON_RECORDING_CHUNK_SIZE") {
            config.recording.chunk_size = parse_number("BEACON_RECORDING_CHUNK_SIZE", &v)?;
        }
        if let Ok(v) = env::var("BEACON_RECORDING_COMPRESSION") {
            config.recording.compression = match v.to_lowercase().as_str() {
                "none" => Compression::None,
                "gzip" => Compression::Gzip,
                other => {
                    return Err(BeaconError::Validation(format!(
                        "BEACON_RECORDING_COMPRESSION must be none or gzip, got '{}'",
                        other
                    )))
                }
            };
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, BeaconError> {
    value
        .to_lowercase()
        .parse::<bool>()
        .map_err(|_| BeaconError::Validation(format!("{} must be true or false", name)))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, BeaconError> {
    value
        .parse::<T>()
        .map_err(|_| BeaconError::Validation(format!("{} must be a valid number", name)))
}

/// OpenTelemetry export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub otlp: OtlpConfig,
    /// Master switch for OTLP export. When off, the telemetry core still
    /// exists (loggers, meters, and tracers resolve) but nothing leaves the
    /// process.
    #[serde(default)]
    pub export_enabled: bool,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
    #[serde(default = "TelemetryConfig::default_metrics_interval")]
    pub metrics_interval_secs: u64,
    /// Head sampling ratio for traces, 0.0..=1.0.
    #[serde(default = "TelemetryConfig::default_sample_ratio")]
    pub sample_ratio: f64,
}

impl TelemetryConfig {
    fn default_metrics_interval() -> u64 {
        DEFAULT_METRICS_INTERVAL_SECS
    }

    fn default_sample_ratio() -> f64 {
        DEFAULT_SAMPLE_RATIO
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp: OtlpConfig::default(),
            export_enabled: false,
            enable_logging: true,
            enable_metrics: true,
            enable_tracing: true,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
        }
    }
}

/// OTLP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtlpConfig {
    #[serde(default = "OtlpConfig::default_grpc_endpoint")]
    pub grpc_endpoint: String,
    #[serde(default = "OtlpConfig::default_http_endpoint")]
    pub http_endpoint: String,
    #[serde(default = "default_true")]
    pub use_grpc: bool,
    /// Extra request headers (authentication); applied on the HTTP path.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "OtlpConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OtlpConfig {
    fn default_grpc_endpoint() -> String {
        DEFAULT_GRPC_ENDPOINT.to_string()
    }

    fn default_http_endpoint() -> String {
        DEFAULT_HTTP_ENDPOINT.to_string()
    }

    fn default_timeout_secs() -> u64 {
        DEFAULT_OTLP_TIMEOUT_SECS
    }

    /// The endpoint selected by the transport toggle.
    pub fn endpoint(&self) -> &str {
        if self.use_grpc {
            &self.grpc_endpoint
        } else {
            &self.http_endpoint
        }
    }
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            grpc_endpoint: Self::default_grpc_endpoint(),
            http_endpoint: Self::default_http_endpoint(),
            use_grpc: true,
            headers: HashMap::new(),
            timeout_secs: DEFAULT_OTLP_TIMEOUT_SECS,
        }
    }
}

/// Continuous profiling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Interval between CPU/memory samples.
    #[serde(default = "ProfilingConfig::default_sample_interval")]
    pub sample_interval_ms: u64,
    /// Extra labels attached to every sample.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ProfilingConfig {
    fn default_sample_interval() -> u64 {
        DEFAULT_PROFILE_INTERVAL_MS
    }
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_interval_ms: DEFAULT_PROFILE_INTERVAL_MS,
            tags: HashMap::new(),
        }
    }
}

/// Chunk compression mode for recorded telemetry logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Binary telemetry-log recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Output file path. Required when recording is enabled.
    #[serde(default)]
    pub path: String,
    /// Records are buffered and flushed in chunks of roughly this size.
    #[serde(default = "RecordingConfig::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub compression: Compression,
}

impl RecordingConfig {
    fn default_chunk_size() -> usize {
        DEFAULT_CHUNK_SIZE
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: Compression::None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BeaconConfig::default();
        assert!(!config.telemetry.export_enabled);
        assert!(config.telemetry.enable_logging);
        assert!(config.telemetry.enable_metrics);
        assert!(config.telemetry.enable_tracing);
        assert_eq!(config.telemetry.otlp.grpc_endpoint, DEFAULT_GRPC_ENDPOINT);
        assert_eq!(config.telemetry.otlp.http_endpoint, DEFAULT_HTTP_ENDPOINT);
        assert!(config.telemetry.otlp.use_grpc);
        assert_eq!(config.telemetry.otlp.timeout_secs, 10);
        assert_eq!(config.telemetry.metrics_interval_secs, 30);
        assert!(!config.profiling.enabled);
        assert_eq!(config.profiling.sample_interval_ms, 1000);
        assert!(!config.recording.enabled);
        assert_eq!(config.recording.chunk_size, 1024 * 1024);
        assert_eq!(config.recording.compression, Compression::None);
    }

    #[test]
    fn endpoint_follows_transport_toggle() {
        let mut otlp = OtlpConfig::default();
        assert_eq!(otlp.endpoint(), DEFAULT_GRPC_ENDPOINT);
        otlp.use_grpc = false;
        assert_eq!(otlp.endpoint(), DEFAULT_HTTP_ENDPOINT);
    }

    #[test]
    fn deserializes_partial_tree_with_defaults() {
        let config: BeaconConfig = serde_json::from_str(
            r#"{"recording": {"enabled": true, "path": "/tmp/run.blog", "compression": "gzip"}}"#,
        )
        .unwrap();
        assert!(config.recording.enabled);
        assert_eq!(config.recording.path, "/tmp/run.blog");
        assert_eq!(config.recording.compression, Compression::Gzip);
        assert_eq!(config.recording.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.telemetry.enable_tracing);
    }

    #[test]
    fn parse_flag_rejects_garbage() {
        assert!(parse_flag("X", "yes-please").is_err());
        assert!(parse_flag("X", "TRUE").unwrap());
    }
}
