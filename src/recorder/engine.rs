//! Recording engine
//!
//! Drives a depth camera through a recording: validation, color controls,
//! first-capture wait, then a rolling sequence of bounded chunks. The chunk
//! that just finished is flushed and closed on a background task while the
//! next one records.

use super::chunk::next_chunk_name;
use super::state::{RecordingOptions, RecordingState, RecordingSummary};
use super::RecordingError;
use crate::device::{DepthCamera, WiredSyncMode};
use crate::writer::{ChunkMeta, ChunkWriter, WriterError};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// How long to wait for the first capture
const FIRST_CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

/// Subordinate devices wait for a trigger from the master, so much longer
const FIRST_CAPTURE_TIMEOUT_SUBORDINATE: Duration = Duration::from_secs(360);

/// Poll interval during the first-capture wait; short enough that a stop
/// request still exits promptly
const FIRST_CAPTURE_POLL: Duration = Duration::from_millis(100);

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecordingEvent {
    /// Recording started
    Started,
    /// A new chunk file was created
    ChunkCreated(String),
    /// A chunk was flushed and closed
    ChunkSaved(String),
    /// Recording stopped
    Stopped,
    /// Error occurred
    Error(String),
}

/// Runs one recording against a camera
pub struct Recorder {
    options: RecordingOptions,
    state: Arc<RwLock<RecordingState>>,
    stop: Arc<AtomicBool>,
    event_tx: broadcast::Sender<RecordingEvent>,
}

impl Recorder {
    pub fn new(options: RecordingOptions) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            options,
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            stop: Arc::new(AtomicBool::new(false)),
            event_tx,
        }
    }

    /// Current engine state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Shared stop flag; setting it ends the recording cleanly
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Record until the stop flag is set
    pub async fn run(
        &self,
        mut camera: Box<dyn DepthCamera>,
    ) -> Result<RecordingSummary, RecordingError> {
        {
            let mut state = self.state.write();
            if *state != RecordingState::Idle {
                return Err(RecordingError::AlreadyRecording);
            }
            *state = RecordingState::Recording;
        }

        let result = self.record(camera.as_mut()).await;

        if self.options.record_imu {
            camera.stop_imu().await;
        }
        camera.stop_cameras().await;

        *self.state.write() = RecordingState::Complete;

        match result {
            Ok(summary) => {
                let _ = self.event_tx.send(RecordingEvent::Stopped);
                tracing::info!(
                    "Recording stopped: {} chunks, {} captures, {:.0}ms",
                    summary.chunks,
                    summary.captures,
                    summary.duration_ms
                );
                Ok(summary)
            }
            Err(e) => {
                let _ = self.event_tx.send(RecordingEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn record(
        &self,
        camera: &mut dyn DepthCamera,
    ) -> Result<RecordingSummary, RecordingError> {
        let options = &self.options;
        let config = options.config;
        config.validate()?;

        let serial = camera.info().serial.clone();
        tracing::info!("Device serial number: {}", serial);
        tracing::info!("Device version: {}", camera.info());

        camera.set_color_controls(&options.controls).await?;
        camera.start_cameras(&config).await?;
        if options.record_imu {
            camera.start_imu().await?;
        }

        tracing::info!("Device started");
        let _ = self.event_tx.send(RecordingEvent::Started);

        let id = Uuid::new_v4();
        let started = Instant::now();

        // Wait for the first capture before creating any chunk.
        let first_capture_timeout = match config.wired_sync_mode {
            WiredSyncMode::Subordinate => {
                tracing::info!("[subordinate mode] Waiting for trigger from master");
                FIRST_CAPTURE_TIMEOUT_SUBORDINATE
            }
            _ => FIRST_CAPTURE_TIMEOUT,
        };

        let mut got_first = false;
        while !self.stopping() && started.elapsed() < first_capture_timeout {
            if camera.get_capture(FIRST_CAPTURE_POLL).await?.is_some() {
                got_first = true;
                break;
            }
        }

        if self.stopping() {
            // Stop requested before the first capture arrived; nothing to
            // flush, this is a clean exit.
            return Ok(self.summary(id, Vec::new(), 0, 0, started));
        }
        if !got_first {
            return Err(RecordingError::FirstCaptureTimeout);
        }

        tracing::info!("Started recording");

        let block_length = Duration::from_secs(options.max_block_secs);
        let capture_timeout = config.camera_fps.frame_interval();

        let mut counter = 0u32;
        let mut chunk_paths: Vec<PathBuf> = Vec::new();
        let mut captures_total = 0u64;
        let mut imu_total = 0u64;
        let mut flush: Option<JoinHandle<Result<ChunkMeta, WriterError>>> = None;

        let loop_result: Result<(), RecordingError> = loop {
            if self.stopping() {
                break Ok(());
            }

            let chunk_name = next_chunk_name(&options.base_filename, counter);
            let chunk_dir = options.output_dir.join(&chunk_name);

            let mut writer = ChunkWriter::create(&chunk_dir, id, counter, &serial, &config)?;
            if options.record_imu {
                writer.add_imu_track()?;
            }
            writer.write_header()?;

            tracing::info!("Created chunk: {}", chunk_dir.display());
            let _ = self
                .event_tx
                .send(RecordingEvent::ChunkCreated(chunk_name.clone()));

            let chunk_start = Instant::now();
            let mut device_error: Option<RecordingError> = None;

            while !self.stopping() && chunk_start.elapsed() < block_length {
                let capture = match camera.get_capture(capture_timeout).await {
                    Ok(Some(capture)) => capture,
                    Ok(None) => continue,
                    Err(e) => {
                        device_error = Some(e.into());
                        break;
                    }
                };

                writer.write_capture(&capture)?;
                captures_total += 1;

                if options.record_imu {
                    // Drain whatever the IMU queued since the last capture.
                    loop {
                        match camera.get_imu_sample().await {
                            Ok(Some(sample)) => {
                                writer.write_imu_sample(&sample)?;
                                imu_total += 1;
                            }
                            Ok(None) => break,
                            Err(e) => {
                                device_error = Some(e.into());
                                break;
                            }
                        }
                    }
                    if device_error.is_some() {
                        break;
                    }
                }
            }

            tracing::info!("Saving chunk: {}", chunk_dir.display());

            // The previous chunk must be on disk before this one is handed
            // to the background flush.
            if let Some(handle) = flush.take() {
                let meta = Self::join_flush(handle).await?;
                self.chunk_saved(&meta);
            }

            chunk_paths.push(chunk_dir);
            flush = Some(tokio::task::spawn_blocking(move || writer.close()));
            counter += 1;

            if let Some(e) = device_error {
                break Err(e);
            }
        };

        // Final chunk flush, on both the clean and the error path.
        if let Some(handle) = flush.take() {
            let meta = Self::join_flush(handle).await?;
            self.chunk_saved(&meta);
        }

        loop_result?;

        Ok(self.summary(id, chunk_paths, captures_total, imu_total, started))
    }

    async fn join_flush(
        handle: JoinHandle<Result<ChunkMeta, WriterError>>,
    ) -> Result<ChunkMeta, RecordingError> {
        let meta = handle
            .await
            .map_err(|e| RecordingError::FlushTask(e.to_string()))??;
        Ok(meta)
    }

    fn chunk_saved(&self, meta: &ChunkMeta) {
        let _ = self.event_tx.send(RecordingEvent::ChunkSaved(format!(
            "chunk {} ({} captures, {} imu samples)",
            meta.chunk_index, meta.captures, meta.imu_samples
        )));
    }

    fn summary(
        &self,
        id: Uuid,
        chunk_paths: Vec<PathBuf>,
        captures: u64,
        imu_samples: u64,
        started: Instant,
    ) -> RecordingSummary {
        RecordingSummary {
            id,
            chunks: chunk_paths.len(),
            captures,
            imu_samples,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            chunk_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ColorResolution, DepthMode, DeviceConfig, SimulatedCamera};
    use crate::writer;
    use tempfile::tempdir;

    fn test_options(dir: &std::path::Path) -> RecordingOptions {
        RecordingOptions {
            output_dir: dir.to_path_buf(),
            max_block_secs: 1,
            config: DeviceConfig {
                color_resolution: ColorResolution::Off,
                depth_mode: DepthMode::Nfov2x2Binned,
                ..DeviceConfig::default()
            },
            ..RecordingOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_rolling_chunks() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(test_options(dir.path()));
        let mut events = recorder.subscribe();

        let stop = recorder.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            stop.store(true, Ordering::SeqCst);
        });

        let camera = SimulatedCamera::open(0).unwrap();
        let summary = recorder.run(Box::new(camera)).await.unwrap();

        // 2.5s of recording with 1s blocks: at least two full chunks.
        assert!(summary.chunks >= 2, "expected >= 2 chunks, got {}", summary.chunks);
        assert!(summary.captures > 0);
        assert!(summary.imu_samples > 0);
        assert_eq!(recorder.state(), RecordingState::Complete);

        for (index, path) in summary.chunk_paths.iter().enumerate() {
            assert!(path.exists(), "missing chunk {}", path.display());
            let meta = writer::read_meta(path).unwrap();
            assert_eq!(meta.chunk_index, index as u32);
            assert_eq!(meta.recording_id, summary.id);
            assert!(meta.has_imu_track);
        }

        // First chunk name follows the rolling scheme.
        assert!(summary.chunk_paths[0].ends_with("capture_000000.rec"));

        let mut saw_started = false;
        let mut saved = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                RecordingEvent::Started => saw_started = true,
                RecordingEvent::ChunkSaved(_) => saved += 1,
                _ => {}
            }
        }
        assert!(saw_started);
        assert_eq!(saved, summary.chunks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_capture_is_clean() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(test_options(dir.path()));

        // The camera never produces a frame; stop arrives mid-wait.
        let camera = SimulatedCamera::open(0).unwrap().with_initial_timeouts(u32::MAX);

        let stop = recorder.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            stop.store(true, Ordering::SeqCst);
        });

        let summary = recorder.run(Box::new(camera)).await.unwrap();
        assert_eq!(summary.chunks, 0);
        assert_eq!(summary.captures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_capture_timeout_is_an_error() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(test_options(dir.path()));

        let camera = SimulatedCamera::open(0).unwrap().with_initial_timeouts(u32::MAX);

        let err = recorder.run(Box::new(camera)).await.unwrap_err();
        assert!(matches!(err, RecordingError::FirstCaptureTimeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subordinate_mode_waits_longer_for_first_capture() {
        let dir = tempdir().unwrap();
        let mut options = test_options(dir.path());
        options.config.wired_sync_mode = WiredSyncMode::Subordinate;
        let recorder = Recorder::new(options);

        // The first frame arrives after 120s of 100ms polls; standalone mode
        // would have timed out at 60s.
        let camera = SimulatedCamera::open(0).unwrap().with_initial_timeouts(1_200);

        let stop = recorder.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(121_500)).await;
            stop.store(true, Ordering::SeqCst);
        });

        let summary = recorder.run(Box::new(camera)).await.unwrap();
        assert!(summary.chunks >= 1);
        assert!(summary.captures > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_timeouts_do_not_abort() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(test_options(dir.path()));

        let camera = SimulatedCamera::open(0).unwrap().with_initial_timeouts(5);

        let stop = recorder.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1_500)).await;
            stop.store(true, Ordering::SeqCst);
        });

        let summary = recorder.run(Box::new(camera)).await.unwrap();
        assert!(summary.chunks >= 1);
        assert!(summary.captures > 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_start() {
        let dir = tempdir().unwrap();
        let mut options = test_options(dir.path());
        options.config.color_resolution = ColorResolution::Off;
        options.config.depth_mode = DepthMode::Off;

        let recorder = Recorder::new(options);
        let camera = SimulatedCamera::open(0).unwrap().without_pacing();
        let err = recorder.run(Box::new(camera)).await.unwrap_err();
        assert!(matches!(err, RecordingError::Device(_)));
    }
}
