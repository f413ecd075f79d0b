//! Acquisition session orchestration.
//!
//! A session walks one camera through
//! `Unconnected -> Connected -> Recording -> Stopped`:
//!
//! 1. open the camera by identifier
//! 2. set the network address (empty selects discovery)
//! 3. with 10G enabled, set the interface and the 10G flag
//! 4. connect
//! 5. start recording
//! 6. query bit depth and ROI, allocate a zeroed buffer
//! 7. grab one frame
//! 8. present it
//! 9. stop recording
//!
//! Failures in steps 1-5 return immediately; nothing is recording yet.
//! From step 6 on the camera is held by a [`RecordingGuard`], so recording
//! is stopped exactly once on every path, including errors, interruption
//! and panics in a sink.

use tracing::{debug, error, info, Dispatch};

use crate::camera::{Camera, CameraRegistry};
use crate::config::SessionConfig;
use crate::error::{AcquisitionError, AppResult};
use crate::frame::{FrameBuffer, FrameGeometry, FrameStats};
use crate::interrupt::InterruptFlag;
use crate::logging::build_logger;
use crate::sink::FrameSink;

/// Lifecycle of the camera within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Camera handle obtained, link not negotiated
    Unconnected,
    /// Link up, not recording
    Connected,
    /// Recording started
    Recording,
    /// Recording stopped; terminal
    Stopped,
}

impl SessionState {
    /// The only state reachable from `self`, if any.
    pub fn next(self) -> Option<SessionState> {
        match self {
            SessionState::Unconnected => Some(SessionState::Connected),
            SessionState::Connected => Some(SessionState::Recording),
            SessionState::Recording => Some(SessionState::Stopped),
            SessionState::Stopped => None,
        }
    }

    /// Move to `to`, which must be the state directly after `self`.
    pub fn advance(&mut self, to: SessionState) -> AppResult<()> {
        if self.next() != Some(to) {
            return Err(AcquisitionError::DeviceState(format!(
                "invalid session transition {self:?} -> {to:?}"
            )));
        }
        debug!(from = ?*self, to = ?to, "Session state");
        *self = to;
        Ok(())
    }
}

/// Keeps a camera recording and stops it exactly once.
///
/// Call [`stop`](Self::stop) to observe the result of stopping; if the guard
/// is dropped without it, recording is stopped and a failure is logged.
pub struct RecordingGuard<'a> {
    camera: &'a mut dyn Camera,
    stopped: bool,
}

impl<'a> RecordingGuard<'a> {
    /// Start recording on `camera`.
    pub fn start(camera: &'a mut dyn Camera) -> AppResult<Self> {
        camera.start_recording()?;
        Ok(Self {
            camera,
            stopped: false,
        })
    }

    /// The recording camera.
    pub fn camera(&mut self) -> &mut dyn Camera {
        &mut *self.camera
    }

    /// Stop recording now.
    pub fn stop(mut self) -> AppResult<()> {
        self.stopped = true;
        self.camera.stop_recording()
    }
}

impl Drop for RecordingGuard<'_> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = self.camera.stop_recording() {
            error!(camera = self.camera.name(), "Failed to stop recording: {e}");
        }
    }
}

/// Outcome of a successful session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Identifier the camera was opened with
    pub camera: String,
    /// Geometry reported by the camera after starting
    pub geometry: FrameGeometry,
    /// Statistics of the grabbed frame
    pub stats: FrameStats,
    /// The grabbed frame
    pub frame: FrameBuffer,
}

/// Runs acquisition sessions with an explicit logger.
///
/// The logger is installed for the duration of each session only; the
/// process-wide default subscriber is never touched.
pub struct Orchestrator {
    logger: Dispatch,
    interrupt: Option<InterruptFlag>,
}

impl Orchestrator {
    /// Orchestrator logging to `logger`.
    pub fn new(logger: Dispatch) -> Self {
        Self {
            logger,
            interrupt: None,
        }
    }

    /// Abort sessions between steps once `flag` is raised.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Run one session: connect, grab a single frame, present it to `sink`
    /// and stop recording.
    pub fn run_session(
        &self,
        registry: &dyn CameraRegistry,
        config: &SessionConfig,
        sink: &mut dyn FrameSink,
    ) -> AppResult<SessionReport> {
        tracing::dispatcher::with_default(&self.logger, || {
            let span = tracing::info_span!("session", camera = %config.camera);
            let _entered = span.enter();
            let result = self.run(registry, config, sink);
            if let Err(e) = &result {
                error!("Session failed: {e}");
            }
            result
        })
    }

    fn run(
        &self,
        registry: &dyn CameraRegistry,
        config: &SessionConfig,
        sink: &mut dyn FrameSink,
    ) -> AppResult<SessionReport> {
        debug!("Opening camera");
        let mut camera = registry.open(&config.camera)?;
        let mut state = SessionState::Unconnected;

        if config.uses_discovery() {
            debug!("No address configured, using discovery");
        } else {
            debug!(address = %config.network_address, "Setting network address");
        }
        camera.set_network_address(&config.network_address)?;

        if config.enable_10ge {
            debug!(interface = %config.network_interface, "Enabling 10G link");
            camera.set_network_interface(&config.network_interface)?;
            camera.set_enable_10ge(true)?;
        }

        info!("Connecting");
        camera.set_connect(true)?;
        state.advance(SessionState::Connected)?;
        info!("Connected");

        let mut recording = RecordingGuard::start(camera.as_mut())?;
        state.advance(SessionState::Recording)?;
        info!("Recording started");

        let acquired = self.acquire(recording.camera(), sink);
        let stopped = recording.stop();
        // A failed stop leaves the camera in the recording state.
        if stopped.is_ok() {
            state.advance(SessionState::Stopped)?;
        }

        match (acquired, stopped) {
            (Ok(frame), Ok(())) => {
                info!("Recording stopped");
                let geometry = frame.geometry();
                Ok(SessionReport {
                    camera: config.camera.clone(),
                    geometry,
                    stats: frame.stats(),
                    frame,
                })
            }
            (Ok(_), Err(stop_err)) => {
                error!(state = ?state, "Camera may still be recording");
                Err(stop_err)
            }
            (Err(e), Ok(())) => {
                debug!(state = ?state, "Recording stopped after failure");
                Err(e)
            }
            (Err(e), Err(stop_err)) => {
                error!(state = ?state, "Failed to stop recording: {stop_err}");
                Err(e)
            }
        }
    }

    fn acquire(&self, camera: &mut dyn Camera, sink: &mut dyn FrameSink) -> AppResult<FrameBuffer> {
        let geometry = camera.geometry()?;
        geometry.validate().map_err(AcquisitionError::DeviceState)?;
        debug!(
            %geometry,
            depth = geometry.pixel_depth().as_str(),
            bytes = geometry.byte_len(),
            "Allocating receive buffer"
        );
        let mut frame = FrameBuffer::zeroed(geometry);

        self.check_interrupt()?;
        info!("Grabbing frame");
        camera.grab(&mut frame)?;
        info!("Frame grabbed");
        self.check_interrupt()?;

        sink.present(&frame)?;
        self.check_interrupt()?;
        Ok(frame)
    }

    fn check_interrupt(&self) -> AppResult<()> {
        match &self.interrupt {
            Some(flag) if flag.is_raised() => {
                info!("Interrupted by user");
                Err(AcquisitionError::Interrupted)
            }
            _ => Ok(()),
        }
    }
}

/// Run one session with a stderr logger at the configured level.
pub fn run_session(
    registry: &dyn CameraRegistry,
    config: &SessionConfig,
    sink: &mut dyn FrameSink,
) -> AppResult<SessionReport> {
    Orchestrator::new(build_logger(config.log_level)).run_session(registry, config, sink)
}
