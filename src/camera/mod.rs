//! Camera capability interface.
//!
//! [`Camera`] exposes exactly the properties and actions a single-frame
//! session needs, one method per property. Adapters implement it over a
//! concrete backend:
//!
//! - [`mock`]: in-process simulated camera, always available
//! - `uca`: libuca plugin library (feature `uca_hardware`)
//!
//! A [`CameraRegistry`] turns a string identifier into a camera handle.

use crate::error::AppResult;
use crate::frame::{FrameBuffer, FrameGeometry};

pub mod mock;
#[cfg(feature = "uca_hardware")]
pub mod uca;

pub use mock::{CallLog, CameraCall, MockCamera, MockCameraConfig, MockOperation, MockRegistry};
#[cfg(feature = "uca_hardware")]
pub use uca::{UcaCamera, UcaPluginManager};

/// Registry identifier of the built-in simulated camera.
pub const MOCK_CAMERA: &str = "mock";

/// Control surface of a network-attached camera.
///
/// Setters must be called in session order: network properties while
/// unconnected, then `set_connect(true)`, then `start_recording`. Geometry
/// getters are only meaningful once connected, because the ROI and bit depth
/// may depend on the negotiated link.
pub trait Camera {
    /// Registry identifier this camera was opened with.
    fn name(&self) -> &str;

    /// Set the camera's IP address. An empty string selects discovery.
    fn set_network_address(&mut self, address: &str) -> AppResult<()>;

    /// Set the host interface the 10G link is attached to.
    fn set_network_interface(&mut self, interface: &str) -> AppResult<()>;

    /// Enable or disable the 10G data link.
    fn set_enable_10ge(&mut self, enable: bool) -> AppResult<()>;

    /// Connect to (or disconnect from) the camera. Blocks during link
    /// negotiation.
    fn set_connect(&mut self, connect: bool) -> AppResult<()>;

    /// Sensor bit depth.
    fn sensor_bitdepth(&self) -> AppResult<u32>;

    /// ROI height in rows.
    fn roi_height(&self) -> AppResult<usize>;

    /// ROI width in columns.
    fn roi_width(&self) -> AppResult<usize>;

    /// Start recording.
    fn start_recording(&mut self) -> AppResult<()>;

    /// Fill `frame` with one frame. Blocks until the frame has been written.
    fn grab(&mut self, frame: &mut FrameBuffer) -> AppResult<()>;

    /// Stop recording.
    fn stop_recording(&mut self) -> AppResult<()>;

    /// Query bit depth and ROI in one go.
    fn geometry(&self) -> AppResult<FrameGeometry> {
        let bitdepth = self.sensor_bitdepth()?;
        let height = self.roi_height()?;
        let width = self.roi_width()?;
        Ok(FrameGeometry::new(bitdepth, height, width))
    }
}

/// Factory for camera handles.
pub trait CameraRegistry {
    /// Identifiers this registry can open.
    fn available_cameras(&self) -> AppResult<Vec<String>>;

    /// Open the camera registered under `name`.
    ///
    /// Fails with `DeviceNotFound` for unknown identifiers or when no
    /// matching hardware responds.
    fn open(&self, name: &str) -> AppResult<Box<dyn Camera>>;
}
