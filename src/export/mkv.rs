//! Matroska muxing via FFmpeg
//!
//! A chunk bundle holds raw frames; ffmpeg turns them into an `.mkv`. The
//! external tool's exit status is propagated verbatim.

use crate::device::{Capture, Frame};
use crate::writer::{self, CaptureReader, ChunkMeta, WriterError};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Chunk(#[from] WriterError),

    #[error("chunk has no video track to mux")]
    NoVideoTrack,

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

/// Which plane of each capture feeds the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoPlane {
    Depth,
    Color,
}

/// Raw-video parameters for the ffmpeg input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaneSpec {
    plane: VideoPlane,
    width: u32,
    height: u32,
    pix_fmt: &'static str,
}

/// Pick the plane to mux: depth when present, otherwise color
fn video_plane(meta: &ChunkMeta) -> Result<PlaneSpec, ExportError> {
    if let Some((width, height)) = meta.config.depth_mode.dimensions() {
        return Ok(PlaneSpec {
            plane: VideoPlane::Depth,
            width,
            height,
            pix_fmt: "gray16le",
        });
    }
    if let Some((width, height)) = meta.config.color_resolution.dimensions() {
        return Ok(PlaneSpec {
            plane: VideoPlane::Color,
            width,
            height,
            pix_fmt: "bgra",
        });
    }
    Err(ExportError::NoVideoTrack)
}

fn select_frame<'a>(capture: &'a Capture, plane: VideoPlane) -> Option<&'a Frame> {
    match plane {
        VideoPlane::Depth => capture.depth.as_ref(),
        VideoPlane::Color => capture.color.as_ref(),
    }
}

/// Mux a chunk bundle into a Matroska file
///
/// Frames are encoded losslessly (FFV1), matching the archival intent of
/// depth recordings.
pub fn mux_chunk_to_mkv(chunk_dir: &Path, output: &Path) -> Result<(), ExportError> {
    let meta = writer::read_meta(chunk_dir)?;
    let spec = video_plane(&meta)?;
    let fps = meta.config.camera_fps.as_u32();

    tracing::info!(
        "Muxing chunk {} ({} captures) to {}",
        chunk_dir.display(),
        meta.captures,
        output.display()
    );

    let mut process = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            spec.pix_fmt,
            "-s",
            &format!("{}x{}", spec.width, spec.height),
            "-r",
            &fps.to_string(),
            "-i",
            "-",
            "-c:v",
            "ffv1",
        ])
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExportError::Ffmpeg(format!("failed to start FFmpeg: {}", e)))?;

    let mut stdin = process
        .stdin
        .take()
        .ok_or_else(|| ExportError::Ffmpeg("failed to capture FFmpeg stdin".to_string()))?;

    let mut reader = CaptureReader::open(chunk_dir)?;
    let mut frames_written = 0u64;
    while let Some(capture) = reader.next_capture()? {
        if let Some(frame) = select_frame(&capture, spec.plane) {
            stdin.write_all(&frame.data)?;
            frames_written += 1;
        }
    }

    // Closing stdin signals EOF to FFmpeg.
    drop(stdin);

    let output_status = process
        .wait_with_output()
        .map_err(|e| ExportError::Ffmpeg(format!("failed to wait for FFmpeg: {}", e)))?;

    if !output_status.status.success() {
        let stderr = String::from_utf8_lossy(&output_status.stderr);
        return Err(ExportError::Ffmpeg(format!(
            "FFmpeg exited with error: {}",
            stderr
        )));
    }

    tracing::info!("Muxed {} frames", frames_written);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ColorResolution, DepthMode, DeviceConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn meta_with(config: DeviceConfig) -> ChunkMeta {
        ChunkMeta {
            recording_id: Uuid::new_v4(),
            chunk_index: 0,
            device_serial: "SIM000000000".to_string(),
            config,
            has_imu_track: false,
            created_at: Utc::now(),
            captures: 0,
            imu_samples: 0,
        }
    }

    #[test]
    fn test_depth_plane_is_preferred() {
        let spec = video_plane(&meta_with(DeviceConfig::default())).unwrap();
        assert_eq!(spec.plane, VideoPlane::Depth);
        assert_eq!(spec.pix_fmt, "gray16le");
        assert_eq!((spec.width, spec.height), (640, 576));
    }

    #[test]
    fn test_color_plane_when_depth_off() {
        let config = DeviceConfig {
            depth_mode: DepthMode::Off,
            color_resolution: ColorResolution::R720p,
            ..DeviceConfig::default()
        };
        let spec = video_plane(&meta_with(config)).unwrap();
        assert_eq!(spec.plane, VideoPlane::Color);
        assert_eq!(spec.pix_fmt, "bgra");
        assert_eq!((spec.width, spec.height), (1280, 720));
    }

    #[test]
    fn test_no_track_is_an_error() {
        let config = DeviceConfig {
            depth_mode: DepthMode::Off,
            color_resolution: ColorResolution::Off,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            video_plane(&meta_with(config)),
            Err(ExportError::NoVideoTrack)
        ));
    }

    #[test]
    fn test_missing_chunk_surfaces_as_chunk_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = mux_chunk_to_mkv(&dir.path().join("absent"), &dir.path().join("out.mkv"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Chunk(_)));
    }
}
