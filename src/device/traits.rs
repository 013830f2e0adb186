//! Depth-camera trait definitions
//!
//! Hardware-agnostic types and the `DepthCamera` trait the recording engine
//! runs against. Real sensor SDK bindings and the simulated backend both
//! plug in behind this seam.

use super::DeviceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Camera frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum FramesPerSecond {
    #[serde(rename = "5")]
    #[value(name = "5")]
    Fps5,
    #[serde(rename = "15")]
    #[value(name = "15")]
    Fps15,
    #[serde(rename = "30")]
    #[value(name = "30")]
    Fps30,
}

impl FramesPerSecond {
    /// Frame rate as an integer (5, 15, or 30)
    pub fn as_u32(&self) -> u32 {
        match self {
            FramesPerSecond::Fps5 => 5,
            FramesPerSecond::Fps15 => 15,
            FramesPerSecond::Fps30 => 30,
        }
    }

    /// Interval between frames at this rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.as_u32() as u64)
    }
}

/// Color camera resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorResolution {
    Off,
    R720p,
    R1080p,
    R1440p,
    R2160p,
}

impl ColorResolution {
    /// Pixel dimensions, `None` when the color camera is off
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ColorResolution::Off => None,
            ColorResolution::R720p => Some((1280, 720)),
            ColorResolution::R1080p => Some((1920, 1080)),
            ColorResolution::R1440p => Some((2560, 1440)),
            ColorResolution::R2160p => Some((3840, 2160)),
        }
    }
}

/// Depth sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DepthMode {
    Off,
    Nfov2x2Binned,
    NfovUnbinned,
    Wfov2x2Binned,
    WfovUnbinned,
    PassiveIr,
}

impl DepthMode {
    /// Pixel dimensions of the depth image, `None` when off
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            DepthMode::Off => None,
            DepthMode::Nfov2x2Binned => Some((320, 288)),
            DepthMode::NfovUnbinned => Some((640, 576)),
            DepthMode::Wfov2x2Binned => Some((512, 512)),
            DepthMode::WfovUnbinned => Some((1024, 1024)),
            DepthMode::PassiveIr => Some((1024, 1024)),
        }
    }
}

/// External synchronization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WiredSyncMode {
    Standalone,
    Master,
    Subordinate,
}

/// Camera configuration for a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub camera_fps: FramesPerSecond,
    pub color_resolution: ColorResolution,
    pub depth_mode: DepthMode,
    pub wired_sync_mode: WiredSyncMode,
}

impl DeviceConfig {
    /// Reject configurations that cannot produce any frames
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.color_resolution == ColorResolution::Off && self.depth_mode == DepthMode::Off {
            return Err(DeviceError::InvalidConfig(
                "either the color or depth modes must be enabled to record".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            camera_fps: FramesPerSecond::Fps30,
            color_resolution: ColorResolution::R1080p,
            depth_mode: DepthMode::NfovUnbinned,
            wired_sync_mode: WiredSyncMode::Standalone,
        }
    }
}

/// Exposure control: automatic or a manual value in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    Auto,
    Manual(i32),
}

/// Gain control: automatic or a manual sensor gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gain {
    Auto,
    Manual(i32),
}

/// Color camera controls applied before the cameras start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorControls {
    pub exposure: Exposure,
    pub gain: Gain,
}

impl Default for ColorControls {
    fn default() -> Self {
        Self {
            exposure: Exposure::Auto,
            gain: Gain::Auto,
        }
    }
}

/// A firmware component version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub iteration: u32,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.iteration)
    }
}

/// Identity and firmware state of an opened device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Device serial number
    pub serial: String,

    /// Release firmware build (as opposed to debug)
    pub firmware_release: bool,

    /// Color camera firmware
    pub rgb: FirmwareVersion,

    /// Depth camera firmware
    pub depth: FirmwareVersion,

    /// Depth sensor version (major.minor)
    pub depth_sensor: (u32, u32),

    /// Audio firmware
    pub audio: FirmwareVersion,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; C: {}; D: {}[{}.{}]; A: {}",
            if self.firmware_release { "Rel" } else { "Dbg" },
            self.rgb,
            self.depth,
            self.depth_sensor.0,
            self.depth_sensor.1,
            self.audio
        )
    }
}

/// A single image plane in a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One synchronized capture from the device
#[derive(Debug, Clone)]
pub struct Capture {
    /// Device timestamp in microseconds
    pub timestamp_us: u64,

    /// Color image, if the color camera is enabled
    pub color: Option<Frame>,

    /// Depth image, if the depth sensor is enabled
    pub depth: Option<Frame>,
}

/// One inertial sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImuSample {
    /// Device timestamp in microseconds
    pub timestamp_us: u64,

    /// Accelerometer reading (m/s^2)
    pub acc: [f32; 3],

    /// Gyroscope reading (rad/s)
    pub gyro: [f32; 3],

    /// Sensor temperature (degrees C)
    pub temperature: f32,
}

/// A depth camera the recording engine can drive
///
/// `get_capture` and `get_imu_sample` return `Ok(None)` on timeout / no data
/// available; a hard device failure is `Err`.
#[async_trait]
pub trait DepthCamera: Send {
    /// Identity of the opened device
    fn info(&self) -> &DeviceInfo;

    /// Apply color camera controls
    async fn set_color_controls(&mut self, controls: &ColorControls) -> Result<(), DeviceError>;

    /// Start the cameras with the given configuration
    async fn start_cameras(&mut self, config: &DeviceConfig) -> Result<(), DeviceError>;

    /// Start the IMU stream (cameras must be running)
    async fn start_imu(&mut self) -> Result<(), DeviceError>;

    /// Wait up to `timeout` for the next capture
    async fn get_capture(&mut self, timeout: Duration) -> Result<Option<Capture>, DeviceError>;

    /// Fetch the next queued IMU sample without waiting
    async fn get_imu_sample(&mut self) -> Result<Option<ImuSample>, DeviceError>;

    /// Stop the IMU stream
    async fn stop_imu(&mut self);

    /// Stop the cameras
    async fn stop_cameras(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_conversion() {
        assert_eq!(FramesPerSecond::Fps5.as_u32(), 5);
        assert_eq!(FramesPerSecond::Fps15.as_u32(), 15);
        assert_eq!(FramesPerSecond::Fps30.as_u32(), 30);
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(
            FramesPerSecond::Fps30.frame_interval(),
            Duration::from_millis(33)
        );
        assert_eq!(
            FramesPerSecond::Fps5.frame_interval(),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_config_rejects_all_off() {
        let config = DeviceConfig {
            color_resolution: ColorResolution::Off,
            depth_mode: DepthMode::Off,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DeviceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_accepts_depth_only() {
        let config = DeviceConfig {
            color_resolution: ColorResolution::Off,
            depth_mode: DepthMode::NfovUnbinned,
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_info_display() {
        let info = DeviceInfo {
            serial: "000123456789".to_string(),
            firmware_release: true,
            rgb: FirmwareVersion { major: 1, minor: 6, iteration: 110 },
            depth: FirmwareVersion { major: 1, minor: 6, iteration: 79 },
            depth_sensor: (6, 109),
            audio: FirmwareVersion { major: 1, minor: 6, iteration: 14 },
        };
        assert_eq!(info.to_string(), "Rel; C: 1.6.110; D: 1.6.79[6.109]; A: 1.6.14");
    }
}
