//! Binary telemetry-log recording
//!
//! Records JSON payloads on named topics into a single chunked binary file.
//! Chunks carry a CRC32 and may be gzip-compressed. The file is framed by a
//! magic header and a footer with record counts, so truncated recordings are
//! detectable.

mod writer;

pub use writer::{Recorder, FILE_MAGIC};
