//! Optional Beacon subsystems
//!
//! This crate provides the two independently-gated subsystems: the
//! continuous in-process profiler and the binary telemetry-log recorder.

pub mod profiling;
pub mod recorder;

pub use profiling::{ProfileSample, Profiler};
pub use recorder::Recorder;
