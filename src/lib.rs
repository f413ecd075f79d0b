//! Core library for the phantom-acquire tool.
//!
//! Connects to a network camera through a plugin registry (libuca, or the
//! built-in simulated camera), optionally enables the 10G link, grabs one
//! frame into a buffer sized from the camera's bit depth and ROI, presents
//! it and stops recording on every exit path.

pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod interrupt;
pub mod logging;
pub mod session;
pub mod sink;

pub use camera::{Camera, CameraRegistry};
pub use config::{ConfigOverrides, LogLevel, SessionConfig};
pub use error::{AcquisitionError, AppResult};
pub use frame::{FrameBuffer, FrameGeometry, FrameStats, PixelDepth};
pub use session::{run_session, Orchestrator, RecordingGuard, SessionReport, SessionState};
pub use sink::FrameSink;
