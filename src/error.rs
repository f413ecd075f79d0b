//! Custom error types for the acquisition session.
//!
//! `AcquisitionError` is the single error type surfaced by the library. The
//! first four variants mirror the failure points of a session:
//!
//! - **`DeviceNotFound`**: the plugin registry does not know the requested
//!   camera identifier, or no matching hardware answered.
//! - **`Connection`**: link negotiation failed when the connect flag was set.
//! - **`DeviceState`**: the operation is invalid for the device's current
//!   state (e.g. starting a recording on an unconnected camera).
//! - **`AcquisitionTimeout`**: the blocking grab did not deliver a frame.
//!
//! The remaining variants cover failures around the session: native errors
//! that fit none of the above, buffer/geometry disagreements, user
//! interruption, configuration problems and frame output.
//!
//! No variant is retried at this layer. Every error propagates to the caller
//! after recording has been stopped.

use thiserror::Error;

use crate::frame::FrameGeometry;

/// Convenience alias for results using the acquisition error type.
pub type AppResult<T> = std::result::Result<T, AcquisitionError>;

/// Errors raised while running an acquisition session.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Registry lookup failed.
    #[error("Camera '{camera}' not found: {reason}")]
    DeviceNotFound {
        /// Identifier passed to the registry.
        camera: String,
        /// Reason reported by the registry.
        reason: String,
    },

    /// Link negotiation failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation invalid for the current device state.
    #[error("Device state error: {0}")]
    DeviceState(String),

    /// The grab did not complete.
    #[error("Acquisition timed out: {0}")]
    AcquisitionTimeout(String),

    /// Native failure not covered by a more specific variant.
    #[error("Camera error during {operation}: {message}")]
    Hardware {
        /// Camera operation that failed.
        operation: &'static str,
        /// Message reported by the native library.
        message: String,
    },

    /// Receive buffer does not match the camera's current geometry.
    #[error("Receive buffer {actual} does not match camera geometry {expected}")]
    BufferMismatch {
        /// Geometry reported by the camera.
        expected: FrameGeometry,
        /// Geometry of the buffer handed to the grab.
        actual: FrameGeometry,
    },

    /// The user interrupted the session.
    #[error("Session interrupted by user")]
    Interrupted,

    /// Configuration values failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Configuration sources could not be read or merged.
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    /// I/O failure while presenting a frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding failure while presenting a frame.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<figment::Error> for AcquisitionError {
    fn from(err: figment::Error) -> Self {
        AcquisitionError::ConfigLoad(Box::new(err))
    }
}

impl AcquisitionError {
    /// Whether the error was raised by the camera or its registry, as opposed
    /// to configuration or frame output.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            AcquisitionError::DeviceNotFound { .. }
                | AcquisitionError::Connection(_)
                | AcquisitionError::DeviceState(_)
                | AcquisitionError::AcquisitionTimeout(_)
                | AcquisitionError::Hardware { .. }
        )
    }
}
