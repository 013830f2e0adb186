//! Chunk container writing
//!
//! Each recording chunk is a bundle directory:
//! - `meta.json`: header (device serial, configuration, chunk index, counts)
//! - `captures.bin`: length-prefixed capture records
//! - `imu.jsonl`: one IMU sample per line, present only when the IMU track
//!   was added
//!
//! The header must be written before any capture; the IMU track can only be
//! added before the header. `close()` finalizes the record counts.

use crate::device::{Capture, DeviceConfig, Frame, ImuSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const META_FILE: &str = "meta.json";
pub const CAPTURES_FILE: &str = "captures.bin";
pub const IMU_FILE: &str = "imu.jsonl";

/// Writer-related errors
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("header already written")]
    HeaderAlreadyWritten,

    #[error("header not written yet")]
    HeaderNotWritten,

    #[error("chunk has no IMU track")]
    NoImuTrack,

    #[error("invalid chunk: {0}")]
    InvalidChunk(String),
}

/// Chunk header and (after close) final record counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMeta {
    /// Recording this chunk belongs to
    pub recording_id: Uuid,

    /// Position of this chunk within the recording
    pub chunk_index: u32,

    /// Serial number of the recorded device
    pub device_serial: String,

    /// Camera configuration in effect
    pub config: DeviceConfig,

    /// Whether an IMU track is present
    pub has_imu_track: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Number of capture records (final after close)
    pub captures: u64,

    /// Number of IMU samples (final after close)
    pub imu_samples: u64,
}

/// Writes one chunk bundle
pub struct ChunkWriter {
    dir: PathBuf,
    meta: ChunkMeta,
    captures: Option<BufWriter<File>>,
    imu: Option<BufWriter<File>>,
    header_written: bool,
}

impl ChunkWriter {
    /// Create the chunk directory and an empty writer
    pub fn create(
        dir: &Path,
        recording_id: Uuid,
        chunk_index: u32,
        device_serial: &str,
        config: &DeviceConfig,
    ) -> Result<Self, WriterError> {
        fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            meta: ChunkMeta {
                recording_id,
                chunk_index,
                device_serial: device_serial.to_string(),
                config: *config,
                has_imu_track: false,
                created_at: Utc::now(),
                captures: 0,
                imu_samples: 0,
            },
            captures: None,
            imu: None,
            header_written: false,
        })
    }

    /// Chunk directory path
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Add the IMU track; only valid before the header is written
    pub fn add_imu_track(&mut self) -> Result<(), WriterError> {
        if self.header_written {
            return Err(WriterError::HeaderAlreadyWritten);
        }
        self.meta.has_imu_track = true;
        Ok(())
    }

    /// Write the chunk header and open the track files
    pub fn write_header(&mut self) -> Result<(), WriterError> {
        if self.header_written {
            return Err(WriterError::HeaderAlreadyWritten);
        }

        self.write_meta()?;
        self.captures = Some(BufWriter::new(File::create(
            self.dir.join(CAPTURES_FILE),
        )?));
        if self.meta.has_imu_track {
            self.imu = Some(BufWriter::new(File::create(self.dir.join(IMU_FILE))?));
        }
        self.header_written = true;

        Ok(())
    }

    /// Append one capture record
    pub fn write_capture(&mut self, capture: &Capture) -> Result<(), WriterError> {
        let writer = self
            .captures
            .as_mut()
            .ok_or(WriterError::HeaderNotWritten)?;

        writer.write_all(&capture.timestamp_us.to_le_bytes())?;
        write_plane(writer, capture.color.as_ref())?;
        write_plane(writer, capture.depth.as_ref())?;

        self.meta.captures += 1;
        Ok(())
    }

    /// Append one IMU sample
    pub fn write_imu_sample(&mut self, sample: &ImuSample) -> Result<(), WriterError> {
        if !self.header_written {
            return Err(WriterError::HeaderNotWritten);
        }
        let writer = self.imu.as_mut().ok_or(WriterError::NoImuTrack)?;

        serde_json::to_writer(&mut *writer, sample)?;
        writer.write_all(b"\n")?;

        self.meta.imu_samples += 1;
        Ok(())
    }

    /// Flush buffered track data to disk
    pub fn flush(&mut self) -> Result<(), WriterError> {
        if let Some(writer) = self.captures.as_mut() {
            writer.flush()?;
        }
        if let Some(writer) = self.imu.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Finalize the chunk: flush tracks and rewrite the header with counts
    pub fn close(mut self) -> Result<ChunkMeta, WriterError> {
        if !self.header_written {
            return Err(WriterError::HeaderNotWritten);
        }
        self.flush()?;
        self.write_meta()?;
        Ok(self.meta)
    }

    fn write_meta(&self) -> Result<(), WriterError> {
        let content = serde_json::to_string_pretty(&self.meta)?;
        fs::write(self.dir.join(META_FILE), content)?;
        Ok(())
    }
}

fn write_plane(writer: &mut impl Write, frame: Option<&Frame>) -> Result<(), WriterError> {
    match frame {
        Some(frame) => {
            writer.write_all(&frame.width.to_le_bytes())?;
            writer.write_all(&frame.height.to_le_bytes())?;
            writer.write_all(&(frame.data.len() as u32).to_le_bytes())?;
            writer.write_all(&frame.data)?;
        }
        None => {
            writer.write_all(&0u32.to_le_bytes())?;
            writer.write_all(&0u32.to_le_bytes())?;
            writer.write_all(&0u32.to_le_bytes())?;
        }
    }
    Ok(())
}

fn read_plane(reader: &mut impl Read) -> Result<Option<Frame>, WriterError> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word)?;
    let width = u32::from_le_bytes(word);
    reader.read_exact(&mut word)?;
    let height = u32::from_le_bytes(word);
    reader.read_exact(&mut word)?;
    let len = u32::from_le_bytes(word) as usize;

    if len == 0 {
        return Ok(None);
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    Ok(Some(Frame {
        width,
        height,
        data,
    }))
}

/// Read a chunk's header
pub fn read_meta(dir: &Path) -> Result<ChunkMeta, WriterError> {
    let path = dir.join(META_FILE);
    if !path.exists() {
        return Err(WriterError::InvalidChunk(format!(
            "missing {} in {}",
            META_FILE,
            dir.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Iterate over a chunk's capture records
pub struct CaptureReader {
    reader: BufReader<File>,
}

impl CaptureReader {
    pub fn open(dir: &Path) -> Result<Self, WriterError> {
        let path = dir.join(CAPTURES_FILE);
        if !path.exists() {
            return Err(WriterError::InvalidChunk(format!(
                "missing {} in {}",
                CAPTURES_FILE,
                dir.display()
            )));
        }
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
        })
    }

    /// Read the next capture, `None` at end of file
    pub fn next_capture(&mut self) -> Result<Option<Capture>, WriterError> {
        let mut stamp = [0u8; 8];
        match self.reader.read_exact(&mut stamp) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let timestamp_us = u64::from_le_bytes(stamp);
        let color = read_plane(&mut self.reader)?;
        let depth = read_plane(&mut self.reader)?;

        Ok(Some(Capture {
            timestamp_us,
            color,
            depth,
        }))
    }
}

/// Read a chunk's IMU track
pub fn read_imu_samples(dir: &Path) -> Result<Vec<ImuSample>, WriterError> {
    let path = dir.join(IMU_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(serde_json::from_str(&line)?);
    }
    Ok(samples)
}
