//! Depth-camera abstraction
//!
//! Platform-agnostic device types, the `DepthCamera` trait the engine
//! records against, and the simulated backend.

pub mod simulated;
pub mod traits;

pub use simulated::SimulatedCamera;
pub use traits::{
    Capture, ColorControls, ColorResolution, DepthCamera, DepthMode, DeviceConfig, DeviceInfo,
    Exposure, FirmwareVersion, Frame, FramesPerSecond, Gain, ImuSample, WiredSyncMode,
};

use thiserror::Error;

/// Device-related errors
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device {index} not found ({installed} installed)")]
    NotFound { index: u8, installed: u8 },

    #[error("failed to open device: {0}")]
    Open(String),

    #[error("invalid device configuration: {0}")]
    InvalidConfig(String),

    #[error("color control failed: {0}")]
    Control(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("no sensor backend available: {0}")]
    NoBackend(String),
}

/// Open a camera by index
///
/// Only the simulated backend ships with this crate; the native sensor SDK
/// binds in behind the same trait.
pub fn open(index: u8, simulate: bool) -> Result<Box<dyn DepthCamera>, DeviceError> {
    if simulate {
        return Ok(Box::new(SimulatedCamera::open(index)?));
    }

    Err(DeviceError::NoBackend(
        "native sensor support is not compiled in; pass --simulate".to_string(),
    ))
}
