//! Simulated depth camera
//!
//! Synthesizes captures at the configured frame rate so the recording
//! pipeline can run without sensor hardware. Used by tests and `--simulate`
//! dry runs.

use super::traits::{
    Capture, ColorControls, DepthCamera, DeviceConfig, DeviceInfo, FirmwareVersion, Frame,
    ImuSample,
};
use super::DeviceError;
use async_trait::async_trait;
use std::time::Duration;

/// Number of devices the simulated backend pretends to have attached
pub const SIMULATED_DEVICE_COUNT: u8 = 1;

/// IMU samples queued per capture (the IMU runs faster than the cameras)
const IMU_SAMPLES_PER_CAPTURE: u32 = 4;

/// A depth camera that synthesizes frames
#[derive(Debug)]
pub struct SimulatedCamera {
    info: DeviceInfo,
    config: Option<DeviceConfig>,
    controls: ColorControls,
    imu_running: bool,
    next_timestamp_us: u64,
    imu_timestamp_us: u64,
    imu_queue: u32,
    /// The first N capture requests time out, to exercise retry paths
    timeouts_remaining: u32,
    /// When true, capture pacing sleeps are skipped (fast tests)
    realtime: bool,
}

impl SimulatedCamera {
    /// Number of simulated devices attached
    pub fn installed_count() -> u8 {
        SIMULATED_DEVICE_COUNT
    }

    /// Open the simulated device at `index`
    pub fn open(index: u8) -> Result<Self, DeviceError> {
        if index >= Self::installed_count() {
            return Err(DeviceError::NotFound {
                index,
                installed: Self::installed_count(),
            });
        }

        Ok(Self {
            info: DeviceInfo {
                serial: format!("SIM{:09}", index),
                firmware_release: true,
                rgb: FirmwareVersion { major: 1, minor: 6, iteration: 110 },
                depth: FirmwareVersion { major: 1, minor: 6, iteration: 79 },
                depth_sensor: (6, 109),
                audio: FirmwareVersion { major: 1, minor: 6, iteration: 14 },
            },
            config: None,
            controls: ColorControls::default(),
            imu_running: false,
            next_timestamp_us: 0,
            imu_timestamp_us: 0,
            imu_queue: 0,
            timeouts_remaining: 0,
            realtime: true,
        })
    }

    /// Make the first `count` capture requests time out
    pub fn with_initial_timeouts(mut self, count: u32) -> Self {
        self.timeouts_remaining = count;
        self
    }

    /// Disable frame pacing so captures return immediately
    pub fn without_pacing(mut self) -> Self {
        self.realtime = false;
        self
    }

    /// The controls last applied via `set_color_controls`
    pub fn applied_controls(&self) -> ColorControls {
        self.controls
    }

    fn synthesize_capture(&mut self, config: &DeviceConfig) -> Capture {
        let timestamp_us = self.next_timestamp_us;
        self.next_timestamp_us += config.camera_fps.frame_interval().as_micros() as u64;
        self.imu_queue = IMU_SAMPLES_PER_CAPTURE;

        let depth = config.depth_mode.dimensions().map(|(width, height)| Frame {
            width,
            height,
            // 16-bit depth values, a constant gradient per row.
            data: (0..height)
                .flat_map(|row| {
                    let value = (row as u16).to_le_bytes();
                    std::iter::repeat(value).take(width as usize).flatten()
                })
                .collect(),
        });

        let color = config.color_resolution.dimensions().map(|(width, height)| Frame {
            width,
            height,
            // Flat gray BGRA image; content is irrelevant to the pipeline.
            data: vec![0x80; (width * height * 4) as usize],
        });

        Capture {
            timestamp_us,
            color,
            depth,
        }
    }
}

#[async_trait]
impl DepthCamera for SimulatedCamera {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn set_color_controls(&mut self, controls: &ColorControls) -> Result<(), DeviceError> {
        self.controls = *controls;
        Ok(())
    }

    async fn start_cameras(&mut self, config: &DeviceConfig) -> Result<(), DeviceError> {
        config.validate()?;
        self.config = Some(*config);
        Ok(())
    }

    async fn start_imu(&mut self) -> Result<(), DeviceError> {
        if self.config.is_none() {
            return Err(DeviceError::Stream(
                "cameras must be started before the IMU".to_string(),
            ));
        }
        self.imu_running = true;
        Ok(())
    }

    async fn get_capture(&mut self, timeout: Duration) -> Result<Option<Capture>, DeviceError> {
        let config = self
            .config
            .ok_or_else(|| DeviceError::Stream("cameras are not running".to_string()))?;

        if self.timeouts_remaining > 0 {
            self.timeouts_remaining -= 1;
            if self.realtime {
                tokio::time::sleep(timeout).await;
            }
            return Ok(None);
        }

        if self.realtime {
            let interval = config.camera_fps.frame_interval();
            tokio::time::sleep(interval.min(timeout)).await;
        }

        Ok(Some(self.synthesize_capture(&config)))
    }

    async fn get_imu_sample(&mut self) -> Result<Option<ImuSample>, DeviceError> {
        if !self.imu_running || self.imu_queue == 0 {
            return Ok(None);
        }

        self.imu_queue -= 1;
        let timestamp_us = self.imu_timestamp_us;
        self.imu_timestamp_us += 1_000;

        Ok(Some(ImuSample {
            timestamp_us,
            acc: [0.0, 0.0, 9.81],
            gyro: [0.0, 0.0, 0.0],
            temperature: 24.5,
        }))
    }

    async fn stop_imu(&mut self) {
        self.imu_running = false;
    }

    async fn stop_cameras(&mut self) {
        self.config = None;
        self.imu_running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::traits::{ColorResolution, DepthMode, Exposure, Gain};

    #[test]
    fn test_open_out_of_range_index() {
        let err = SimulatedCamera::open(4).unwrap_err();
        assert!(matches!(err, DeviceError::NotFound { index: 4, .. }));
    }

    #[tokio::test]
    async fn test_capture_requires_started_cameras() {
        let mut camera = SimulatedCamera::open(0).unwrap();
        let result = camera.get_capture(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(DeviceError::Stream(_))));
    }

    #[tokio::test]
    async fn test_capture_carries_configured_planes() {
        let mut camera = SimulatedCamera::open(0).unwrap().without_pacing();
        let config = DeviceConfig {
            color_resolution: ColorResolution::Off,
            depth_mode: DepthMode::Nfov2x2Binned,
            ..DeviceConfig::default()
        };
        camera.start_cameras(&config).await.unwrap();

        let capture = camera
            .get_capture(Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert!(capture.color.is_none());
        let depth = capture.depth.unwrap();
        assert_eq!((depth.width, depth.height), (320, 288));
        assert_eq!(depth.data.len(), 320 * 288 * 2);
    }

    #[tokio::test]
    async fn test_initial_timeouts_then_frames() {
        let mut camera = SimulatedCamera::open(0)
            .unwrap()
            .without_pacing()
            .with_initial_timeouts(2);
        camera.start_cameras(&DeviceConfig::default()).await.unwrap();

        assert!(camera.get_capture(Duration::ZERO).await.unwrap().is_none());
        assert!(camera.get_capture(Duration::ZERO).await.unwrap().is_none());
        assert!(camera.get_capture(Duration::ZERO).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_imu_samples_drain_per_capture() {
        let mut camera = SimulatedCamera::open(0).unwrap().without_pacing();
        camera.start_cameras(&DeviceConfig::default()).await.unwrap();
        camera.start_imu().await.unwrap();

        camera.get_capture(Duration::ZERO).await.unwrap().unwrap();

        let mut drained = 0;
        while camera.get_imu_sample().await.unwrap().is_some() {
            drained += 1;
        }
        assert_eq!(drained, IMU_SAMPLES_PER_CAPTURE);
    }

    #[tokio::test]
    async fn test_color_controls_are_applied() {
        let mut camera = SimulatedCamera::open(0).unwrap();
        let controls = ColorControls {
            exposure: Exposure::Manual(8330),
            gain: Gain::Manual(128),
        };
        camera.set_color_controls(&controls).await.unwrap();
        assert_eq!(camera.applied_controls(), controls);
    }
}
