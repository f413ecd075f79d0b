//! Simulated camera for testing without hardware.
//!
//! `MockCamera` behaves like a network camera that is always reachable (unless
//! configured otherwise): it enforces the connect/record ordering, only
//! reports its geometry once connected, and fills grabbed frames with a
//! deterministic ramp. Every call is appended to a shared [`CallLog`] so a
//! test can inspect what a session did after the camera has been consumed.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Camera, CameraRegistry, MOCK_CAMERA};
use crate::error::{AcquisitionError, AppResult};
use crate::frame::{FrameBuffer, FrameGeometry, PixelDepth, Pixels};

/// A call made on a [`MockCamera`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraCall {
    /// `set_network_address`
    SetNetworkAddress(String),
    /// `set_network_interface`
    SetNetworkInterface(String),
    /// `set_enable_10ge`
    SetEnable10ge(bool),
    /// `set_connect`
    SetConnect(bool),
    /// `sensor_bitdepth`
    SensorBitdepth,
    /// `roi_height`
    RoiHeight,
    /// `roi_width`
    RoiWidth,
    /// `start_recording`
    StartRecording,
    /// `grab`, with the shape and address of the buffer it received
    Grab {
        /// Buffer rows
        rows: usize,
        /// Buffer columns
        columns: usize,
        /// Buffer element width
        depth: PixelDepth,
        /// Address of the buffer's first pixel
        address: usize,
    },
    /// `stop_recording`
    StopRecording,
}

impl CameraCall {
    /// Whether the call writes a camera property.
    pub fn is_property_write(&self) -> bool {
        matches!(
            self,
            CameraCall::SetNetworkAddress(_)
                | CameraCall::SetNetworkInterface(_)
                | CameraCall::SetEnable10ge(_)
                | CameraCall::SetConnect(_)
        )
    }
}

/// Shared, append-only record of camera calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CameraCall>>>);

impl CallLog {
    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<CameraCall> {
        self.0.lock().clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&CameraCall) -> bool) -> usize {
        self.0.lock().iter().filter(|c| predicate(c)).count()
    }

    /// Whether no call has been made.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    fn push(&self, call: CameraCall) {
        self.0.lock().push(call);
    }
}

/// Operations a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MockOperation {
    /// `set_connect(true)`, fails with `Connection`
    Connect,
    /// `start_recording`, fails with `DeviceState`
    StartRecording,
    /// `grab`, fails with `AcquisitionTimeout`
    Grab,
    /// `stop_recording`, fails with `DeviceState`
    StopRecording,
}

/// Behaviour of a simulated camera.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCameraConfig {
    /// Reported sensor bit depth
    pub sensor_bitdepth: u32,
    /// Reported ROI height
    pub roi_height: usize,
    /// Reported ROI width
    pub roi_width: usize,
    /// Whether connecting succeeds
    pub reachable: bool,
    /// Injected failures, with the message each one carries
    pub failures: BTreeMap<MockOperation, String>,
}

impl Default for MockCameraConfig {
    // Geometry of a Phantom streaming 1024x976 frames from a 12-bit sensor.
    fn default() -> Self {
        Self {
            sensor_bitdepth: 12,
            roi_height: 976,
            roi_width: 1024,
            reachable: true,
            failures: BTreeMap::new(),
        }
    }
}

impl MockCameraConfig {
    /// Config reporting the given geometry.
    pub fn with_geometry(sensor_bitdepth: u32, roi_height: usize, roi_width: usize) -> Self {
        Self {
            sensor_bitdepth,
            roi_height,
            roi_width,
            ..Self::default()
        }
    }

    /// Make `operation` fail with `message`.
    pub fn fail_on(mut self, operation: MockOperation, message: impl Into<String>) -> Self {
        self.failures.insert(operation, message.into());
        self
    }

    /// Make connecting fail as if nothing answered.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.sensor_bitdepth, self.roi_height, self.roi_width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockState {
    Unconnected,
    Connected,
    Recording,
}

/// Simulated network camera.
#[derive(Debug)]
pub struct MockCamera {
    name: String,
    config: MockCameraConfig,
    state: MockState,
    network_address: String,
    network_interface: Option<String>,
    enable_10ge: bool,
    frame_count: u32,
    log: CallLog,
}

impl MockCamera {
    /// Create an unconnected camera logging into `log`.
    pub fn new(name: &str, config: MockCameraConfig, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            config,
            state: MockState::Unconnected,
            network_address: String::new(),
            network_interface: None,
            enable_10ge: false,
            frame_count: 0,
            log,
        }
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.state == MockState::Recording
    }

    /// Number of frames delivered so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn injected(&self, operation: MockOperation) -> Option<&str> {
        self.config.failures.get(&operation).map(String::as_str)
    }

    fn require_unconnected(&self, property: &str) -> AppResult<()> {
        if self.state != MockState::Unconnected {
            return Err(AcquisitionError::DeviceState(format!(
                "cannot change {property} while connected"
            )));
        }
        Ok(())
    }

    fn require_connected(&self, property: &str) -> AppResult<()> {
        if self.state == MockState::Unconnected {
            return Err(AcquisitionError::DeviceState(format!(
                "{property} is unavailable before connecting"
            )));
        }
        Ok(())
    }

    fn fill(&self, frame: &mut FrameBuffer) {
        let max = (1u32 << self.config.sensor_bitdepth.min(16)) - 1;
        let offset = self.frame_count as usize;
        let value = |(row, column): (usize, usize)| ((row + column + offset) as u32) % (max + 1);
        match frame.pixels_mut() {
            Pixels::Mono8(a) => {
                for (idx, px) in a.indexed_iter_mut() {
                    *px = value(idx) as u8;
                }
            }
            Pixels::Mono16(a) => {
                for (idx, px) in a.indexed_iter_mut() {
                    *px = value(idx) as u16;
                }
            }
        }
    }
}

impl Camera for MockCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_network_address(&mut self, address: &str) -> AppResult<()> {
        self.log.push(CameraCall::SetNetworkAddress(address.to_string()));
        self.require_unconnected("network address")?;
        self.network_address = address.to_string();
        tracing::debug!(camera = %self.name, address, "Mock network address set");
        Ok(())
    }

    fn set_network_interface(&mut self, interface: &str) -> AppResult<()> {
        self.log.push(CameraCall::SetNetworkInterface(interface.to_string()));
        self.require_unconnected("network interface")?;
        self.network_interface = Some(interface.to_string());
        Ok(())
    }

    fn set_enable_10ge(&mut self, enable: bool) -> AppResult<()> {
        self.log.push(CameraCall::SetEnable10ge(enable));
        self.require_unconnected("10G mode")?;
        if enable && self.network_interface.is_none() {
            return Err(AcquisitionError::DeviceState(
                "10G mode enabled without a network interface".into(),
            ));
        }
        self.enable_10ge = enable;
        Ok(())
    }

    fn set_connect(&mut self, connect: bool) -> AppResult<()> {
        self.log.push(CameraCall::SetConnect(connect));

        if !connect {
            if self.state == MockState::Recording {
                return Err(AcquisitionError::DeviceState(
                    "cannot disconnect while recording".into(),
                ));
            }
            self.state = MockState::Unconnected;
            return Ok(());
        }

        if self.state != MockState::Unconnected {
            return Ok(());
        }
        if let Some(message) = self.injected(MockOperation::Connect) {
            return Err(AcquisitionError::Connection(message.to_string()));
        }
        if !self.config.reachable {
            let target = if self.network_address.is_empty() {
                "no camera answered discovery".to_string()
            } else {
                format!("no camera answered at {}", self.network_address)
            };
            return Err(AcquisitionError::Connection(target));
        }

        self.state = MockState::Connected;
        tracing::info!(
            camera = %self.name,
            address = %self.network_address,
            ten_ge = self.enable_10ge,
            interface = ?self.network_interface,
            "Mock camera connected"
        );
        Ok(())
    }

    fn sensor_bitdepth(&self) -> AppResult<u32> {
        self.log.push(CameraCall::SensorBitdepth);
        self.require_connected("sensor bit depth")?;
        Ok(self.config.sensor_bitdepth)
    }

    fn roi_height(&self) -> AppResult<usize> {
        self.log.push(CameraCall::RoiHeight);
        self.require_connected("ROI height")?;
        Ok(self.config.roi_height)
    }

    fn roi_width(&self) -> AppResult<usize> {
        self.log.push(CameraCall::RoiWidth);
        self.require_connected("ROI width")?;
        Ok(self.config.roi_width)
    }

    fn start_recording(&mut self) -> AppResult<()> {
        self.log.push(CameraCall::StartRecording);
        match self.state {
            MockState::Unconnected => {
                return Err(AcquisitionError::DeviceState(
                    "cannot start recording on an unconnected camera".into(),
                ))
            }
            MockState::Recording => {
                return Err(AcquisitionError::DeviceState("camera is already recording".into()))
            }
            MockState::Connected => {}
        }
        if let Some(message) = self.injected(MockOperation::StartRecording) {
            return Err(AcquisitionError::DeviceState(message.to_string()));
        }
        self.state = MockState::Recording;
        tracing::debug!(camera = %self.name, "Mock recording started");
        Ok(())
    }

    fn grab(&mut self, frame: &mut FrameBuffer) -> AppResult<()> {
        let (rows, columns) = frame.dim();
        self.log.push(CameraCall::Grab {
            rows,
            columns,
            depth: frame.pixel_depth(),
            address: frame.data_address(),
        });

        if self.state != MockState::Recording {
            return Err(AcquisitionError::DeviceState(
                "cannot grab while not recording".into(),
            ));
        }
        if let Some(message) = self.injected(MockOperation::Grab) {
            return Err(AcquisitionError::AcquisitionTimeout(message.to_string()));
        }

        let expected = self.config.geometry();
        let actual = frame.geometry();
        if actual.height != expected.height
            || actual.width != expected.width
            || actual.pixel_depth() != expected.pixel_depth()
        {
            return Err(AcquisitionError::BufferMismatch { expected, actual });
        }

        self.fill(frame);
        self.frame_count += 1;
        tracing::debug!(camera = %self.name, frame = self.frame_count, "Mock frame delivered");
        Ok(())
    }

    fn stop_recording(&mut self) -> AppResult<()> {
        self.log.push(CameraCall::StopRecording);
        if self.state != MockState::Recording {
            return Err(AcquisitionError::DeviceState("camera is not recording".into()));
        }
        // The camera leaves the recording state even when the stop is reported as failed.
        self.state = MockState::Connected;
        if let Some(message) = self.injected(MockOperation::StopRecording) {
            return Err(AcquisitionError::DeviceState(message.to_string()));
        }
        tracing::debug!(camera = %self.name, "Mock recording stopped");
        Ok(())
    }
}

/// Registry of simulated cameras.
///
/// The default registry knows a single camera, `"mock"`, with
/// [`MockCameraConfig::default`].
#[derive(Debug, Clone)]
pub struct MockRegistry {
    cameras: BTreeMap<String, MockCameraConfig>,
    log: CallLog,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::empty().with_camera(MOCK_CAMERA, MockCameraConfig::default())
    }
}

impl MockRegistry {
    /// Registry without any camera.
    pub fn empty() -> Self {
        Self {
            cameras: BTreeMap::new(),
            log: CallLog::default(),
        }
    }

    /// Register (or replace) a camera under `name`.
    pub fn with_camera(mut self, name: &str, config: MockCameraConfig) -> Self {
        self.cameras.insert(name.to_string(), config);
        self
    }

    /// Log shared by every camera this registry opens.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }
}

impl CameraRegistry for MockRegistry {
    fn available_cameras(&self) -> AppResult<Vec<String>> {
        Ok(self.cameras.keys().cloned().collect())
    }

    fn open(&self, name: &str) -> AppResult<Box<dyn Camera>> {
        let config = self
            .cameras
            .get(name)
            .ok_or_else(|| AcquisitionError::DeviceNotFound {
                camera: name.to_string(),
                reason: format!(
                    "not registered (available: {})",
                    self.cameras.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            })?;
        tracing::debug!(camera = name, "Mock camera opened");
        Ok(Box::new(MockCamera::new(name, config.clone(), self.log.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(config: MockCameraConfig) -> MockCamera {
        let mut cam = MockCamera::new("mock", config, CallLog::default());
        cam.set_network_address("").unwrap();
        cam.set_connect(true).unwrap();
        cam
    }

    #[test]
    fn test_geometry_requires_connection() {
        let cam = MockCamera::new("mock", MockCameraConfig::default(), CallLog::default());
        assert!(matches!(
            cam.sensor_bitdepth(),
            Err(AcquisitionError::DeviceState(_))
        ));
        let cam = connected(MockCameraConfig::default());
        assert_eq!(cam.geometry().unwrap(), FrameGeometry::new(12, 976, 1024));
    }

    #[test]
    fn test_start_recording_state_checks() {
        let mut cam = MockCamera::new("mock", MockCameraConfig::default(), CallLog::default());
        assert!(matches!(
            cam.start_recording(),
            Err(AcquisitionError::DeviceState(_))
        ));

        let mut cam = connected(MockCameraConfig::default());
        cam.start_recording().unwrap();
        assert!(cam.is_recording());
        assert!(matches!(
            cam.start_recording(),
            Err(AcquisitionError::DeviceState(_))
        ));
    }

    #[test]
    fn test_network_properties_locked_after_connect() {
        let mut cam = connected(MockCameraConfig::default());
        assert!(cam.set_network_address("10.0.0.1").is_err());
        assert!(cam.set_network_interface("eth1").is_err());
    }

    #[test]
    fn test_10ge_requires_interface() {
        let mut cam = MockCamera::new("mock", MockCameraConfig::default(), CallLog::default());
        assert!(cam.set_enable_10ge(true).is_err());
        cam.set_network_interface("enp1s0").unwrap();
        cam.set_enable_10ge(true).unwrap();
    }

    #[test]
    fn test_unreachable_camera() {
        let mut cam = MockCamera::new(
            "mock",
            MockCameraConfig::default().unreachable(),
            CallLog::default(),
        );
        cam.set_network_address("10.0.0.9").unwrap();
        let err = cam.set_connect(true).unwrap_err();
        assert!(matches!(err, AcquisitionError::Connection(ref m) if m.contains("10.0.0.9")));
    }

    #[test]
    fn test_grab_fills_ramp() {
        let mut cam = connected(MockCameraConfig::with_geometry(8, 3, 4));
        cam.start_recording().unwrap();
        let mut frame = FrameBuffer::zeroed(cam.geometry().unwrap());
        cam.grab(&mut frame).unwrap();
        assert_eq!(frame.get(0, 0), Some(0));
        assert_eq!(frame.get(2, 3), Some(5));
        assert_eq!(cam.frame_count(), 1);
    }

    #[test]
    fn test_grab_rejects_wrong_buffer() {
        let mut cam = connected(MockCameraConfig::with_geometry(16, 4, 8));
        cam.start_recording().unwrap();
        let mut frame = FrameBuffer::zeroed(FrameGeometry::new(8, 4, 8));
        assert!(matches!(
            cam.grab(&mut frame),
            Err(AcquisitionError::BufferMismatch { .. })
        ));
    }

    #[test]
    fn test_injected_grab_failure() {
        let config = MockCameraConfig::with_geometry(12, 2, 2).fail_on(MockOperation::Grab, "no trigger");
        let mut cam = connected(config);
        cam.start_recording().unwrap();
        let mut frame = FrameBuffer::zeroed(cam.geometry().unwrap());
        assert!(matches!(
            cam.grab(&mut frame),
            Err(AcquisitionError::AcquisitionTimeout(ref m)) if m == "no trigger"
        ));
        assert!(frame.is_blank());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = MockRegistry::default();
        assert_eq!(registry.available_cameras().unwrap(), vec!["mock".to_string()]);
        assert!(registry.open("mock").is_ok());
        let err = registry.open("phantom").err().unwrap();
        assert!(matches!(err, AcquisitionError::DeviceNotFound { ref camera, .. } if camera == "phantom"));
    }

    #[test]
    fn test_call_log_shared_across_cameras() {
        let registry = MockRegistry::default();
        let log = registry.call_log();
        let mut cam = registry.open("mock").unwrap();
        cam.set_network_address("").unwrap();
        assert_eq!(log.calls(), vec![CameraCall::SetNetworkAddress(String::new())]);
        assert_eq!(log.count(CameraCall::is_property_write), 1);
    }
}
