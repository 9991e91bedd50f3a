use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Crc;
use serde::Serialize;

use beacon_core::{BeaconError, Compression, RecordingConfig};

/// Magic bytes at the start of every recording file.
pub const FILE_MAGIC: &[u8; 8] = b"BCNREC01";

const OP_HEADER: u8 = 0x01;
const OP_CHUNK: u8 = 0x02;
const OP_FOOTER: u8 = 0x03;

#[derive(Serialize)]
struct FileHeader<'a> {
    library: &'a str,
    version: &'a str,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct FileFooter {
    records: u64,
    chunks: u64,
    closed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct Record<'a> {
    topic: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    payload: serde_json::Value,
}

struct Inner {
    writer: BufWriter<File>,
    chunk: Vec<u8>,
    chunk_size: usize,
    compression: Compression,
    records: u64,
    chunks: u64,
}

/// Chunked binary writer for telemetry-log records.
///
/// The writer is internally synchronized; `record` may be called from many
/// tasks. After `close` the slot is cleared and further records are refused.
pub struct Recorder {
    inner: Mutex<Option<Inner>>,
    path: PathBuf,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Recorder {
    /// Create the recording file and write the header.
    ///
    /// Fails when no path is configured or the file cannot be created.
    pub fn new(config: &RecordingConfig) -> Result<Self, BeaconError> {
        if config.path.is_empty() {
            return Err(BeaconError::startup(
                "recorder",
                anyhow::anyhow!("recording path not specified"),
            ));
        }

        let path = PathBuf::from(&config.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| BeaconError::startup("recorder", e))?;
            }
        }

        let file = File::create(&path).map_err(|e| BeaconError::startup("recorder", e))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(FILE_MAGIC)
            .map_err(|e| BeaconError::startup("recorder", e))?;
        let header = serde_json::to_vec(&FileHeader {
            library: "beacon",
            version: env!("CARGO_PKG_VERSION"),
            created_at: Utc::now(),
        })
        .map_err(|e| BeaconError::startup("recorder", e))?;
        write_frame(&mut writer, OP_HEADER, &header)
            .map_err(|e| BeaconError::startup("recorder", e))?;

        Ok(Self {
            inner: Mutex::new(Some(Inner {
                writer,
                chunk: Vec::with_capacity(config.chunk_size),
                chunk_size: config.chunk_size,
                compression: config.compression,
                records: 0,
                chunks: 0,
            })),
            path,
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one record. The record is buffered and flushed with its chunk.
    pub fn record(&self, topic: &str, payload: serde_json::Value) -> Result<(), BeaconError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let inner = guard
            .as_mut()
            .ok_or_else(|| BeaconError::Io(io::Error::other("recorder is closed")))?;

        let encoded = serde_json::to_vec(&Record {
            topic,
            timestamp: Utc::now(),
            payload,
        })
        .map_err(|e| BeaconError::Io(io::Error::other(e)))?;

        inner
            .chunk
            .extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        inner.chunk.extend_from_slice(&encoded);
        inner.records += 1;

        if inner.chunk.len() >= inner.chunk_size {
            flush_chunk(inner).map_err(BeaconError::Io)?;
        }
        Ok(())
    }

    /// Flush the pending chunk, write the footer, and close the file.
    ///
    /// A second call finds the slot cleared and is a no-op.
    pub fn close(&self) -> Result<(), BeaconError> {
        // Close must stay reachable even after a panicked writer thread, so
        // a poisoned lock is recovered rather than propagated.
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(mut inner) = guard.take() else {
            return Ok(());
        };

        if !inner.chunk.is_empty() {
            flush_chunk(&mut inner).map_err(|e| BeaconError::teardown("recorder", e))?;
        }

        let footer = serde_json::to_vec(&FileFooter {
            records: inner.records,
            chunks: inner.chunks,
            closed_at: Utc::now(),
        })
        .map_err(|e| BeaconError::teardown("recorder", e))?;
        write_frame(&mut inner.writer, OP_FOOTER, &footer)
            .map_err(|e| BeaconError::teardown("recorder", e))?;
        inner
            .writer
            .flush()
            .map_err(|e| BeaconError::teardown("recorder", e))?;
        Ok(())
    }
}

/// Frame layout: opcode byte, little-endian u32 payload length, payload.
fn write_frame(writer: &mut BufWriter<File>, opcode: u8, payload: &[u8]) -> io::Result<()> {
    writer.write_all(&[opcode])?;
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(payload)
}

/// Chunk payload: compression byte, CRC32 and length of the uncompressed
/// record data, then the (possibly compressed) data.
fn flush_chunk(inner: &mut Inner) -> io::Result<()> {
    let uncompressed_len = inner.chunk.len() as u32;
    let mut crc = Crc::new();
    crc.update(&inner.chunk);

    let data = match inner.compression {
        Compression::None => std::mem::take(&mut inner.chunk),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&inner.chunk)?;
            let data = encoder.finish()?;
            inner.chunk.clear();
            data
        }
    };

    let mut payload = Vec::with_capacity(data.len() + 9);
    payload.push(match inner.compression {
        Compression::None => 0,
        Compression::Gzip => 1,
    });
    payload.extend_from_slice(&crc.sum().to_le_bytes());
    payload.extend_from_slice(&uncompressed_len.to_le_bytes());
    payload.extend_from_slice(&data);

    write_frame(&mut inner.writer, OP_CHUNK, &payload)?;

    inner.chunks += 1;
    Ok(())
}
