//! Beacon Core Library
//!
//! This crate provides the service identity, configuration tree, and error
//! types shared across all Beacon components.

pub mod config;
pub mod error;
pub mod identity;

// Re-export commonly used types
pub use config::{
    BeaconConfig, Compression, OtlpConfig, ProfilingConfig, RecordingConfig, TelemetryConfig,
};
pub use error::BeaconError;
pub use identity::{Environment, ServiceIdentity};
