//! Shared helpers for integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

use phantom_acquire::camera::{CameraCall, MockCameraConfig, MockRegistry, MOCK_CAMERA};
use phantom_acquire::config::{LogLevel, SessionConfig};
use phantom_acquire::logging::build_logger_with_writer;
use phantom_acquire::session::Orchestrator;
use phantom_acquire::sink::FrameSink;
use phantom_acquire::{AppResult, FrameBuffer};

/// In-memory log destination.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

/// Orchestrator logging into a fresh capture buffer.
pub fn orchestrator(level: LogLevel) -> (Orchestrator, CapturedLog) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let logger = build_logger_with_writer(level, move || writer.clone());
    (Orchestrator::new(logger), log)
}

/// Config selecting the simulated camera in discovery mode.
pub fn mock_config() -> SessionConfig {
    SessionConfig {
        camera: MOCK_CAMERA.to_string(),
        ..SessionConfig::default()
    }
}

/// Registry with a single `mock` camera.
pub fn registry(config: MockCameraConfig) -> MockRegistry {
    MockRegistry::empty().with_camera(MOCK_CAMERA, config)
}

/// Sink that keeps a copy of every frame it is shown.
#[derive(Default)]
pub struct CollectSink {
    pub frames: Vec<FrameBuffer>,
}

impl FrameSink for CollectSink {
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// Sink that runs a closure, e.g. to simulate Ctrl+C while the frame is shown.
pub struct HookSink<F: FnMut()>(pub F);

impl<F: FnMut()> FrameSink for HookSink<F> {
    fn present(&mut self, _frame: &FrameBuffer) -> AppResult<()> {
        (self.0)();
        Ok(())
    }
}

pub fn stop_count(calls: &[CameraCall]) -> usize {
    calls
        .iter()
        .filter(|c| **c == CameraCall::StopRecording)
        .count()
}

pub fn grab_count(calls: &[CameraCall]) -> usize {
    calls
        .iter()
        .filter(|c| matches!(c, CameraCall::Grab { .. }))
        .count()
}
