//! Recording state management
//!
//! Defines the recording state machine and the options/summary types the
//! engine works with.

use crate::device::{ColorControls, DeviceConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Current state of the recording engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    Idle,
    /// Currently recording
    Recording,
    /// Recording completed
    Complete,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Options for a recording run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    /// Index of the device to record
    pub device_index: u8,

    /// Base chunk file name; the chunk counter is spliced in before the
    /// extension
    pub base_filename: String,

    /// Directory chunks are written into
    pub output_dir: PathBuf,

    /// Maximum length of one chunk in seconds
    pub max_block_secs: u64,

    /// Whether to record the IMU track
    pub record_imu: bool,

    /// Color camera controls
    pub controls: ColorControls,

    /// Camera configuration
    pub config: DeviceConfig,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            device_index: 0,
            base_filename: "capture.rec".to_string(),
            output_dir: PathBuf::from("."),
            max_block_secs: 300,
            record_imu: true,
            controls: ColorControls::default(),
            config: DeviceConfig::default(),
        }
    }
}

/// Result of a completed recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    /// Recording id shared by all chunks
    pub id: Uuid,

    /// Number of chunks written
    pub chunks: usize,

    /// Total capture records written
    pub captures: u64,

    /// Total IMU samples written
    pub imu_samples: u64,

    /// Wall-clock duration in milliseconds
    pub duration_ms: f64,

    /// Paths of the written chunks, in order
    pub chunk_paths: Vec<PathBuf>,
}
