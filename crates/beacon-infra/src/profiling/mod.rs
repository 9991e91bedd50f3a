//! Continuous in-process profiling
//!
//! A background task samples the process's CPU and memory footprint at a
//! configured interval. Samples are emitted as trace-level events and the
//! latest one is retained for direct inspection.

mod profiler;

pub use profiler::{ProfileSample, Profiler};
