//! Recording system module
//!
//! Chunked recording architecture:
//! - `Recorder` drives a `DepthCamera` through the capture loop
//! - chunks roll over at the block boundary, named by `next_chunk_name`
//! - the finished chunk flushes on a background task while the next records

pub mod chunk;
pub mod engine;
pub mod state;

pub use chunk::next_chunk_name;
pub use engine::{Recorder, RecordingEvent};
pub use state::{RecordingOptions, RecordingState, RecordingSummary};

use crate::device::DeviceError;
use crate::writer::WriterError;
use thiserror::Error;

/// Recording engine errors
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("timed out waiting for first capture")]
    FirstCaptureTimeout,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("chunk flush task failed: {0}")]
    FlushTask(String),
}
