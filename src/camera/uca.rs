//! libuca camera adapter.
//!
//! Wraps the libuca plugin manager and a `UcaCamera` GObject behind the
//! [`Camera`]/[`CameraRegistry`] traits. Properties are addressed by their
//! GObject names; `g_object_set` cannot report failures, so every property
//! is looked up on the object's class before it is touched and the connect
//! flag is read back after it has been set.
//!
//! Native errors arrive as `GError`s and are classified by domain and code
//! (see [`classify_error`]).

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;

use uca_sys::*;

use super::{Camera, CameraRegistry};
use crate::error::{AcquisitionError, AppResult};
use crate::frame::{FrameBuffer, Pixels};

const PROP_NETWORK_ADDRESS: &str = "network-address";
const PROP_NETWORK_INTERFACE: &str = "network-interface";
const PROP_ENABLE_10GE: &str = "enable-10ge";
const PROP_CONNECT: &str = "connect";
const PROP_SENSOR_BITDEPTH: &str = "sensor-bitdepth";
const PROP_ROI_HEIGHT: &str = "roi-height";
const PROP_ROI_WIDTH: &str = "roi-width";

/// Error domain of a `GError`, resolved from its quark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    /// `uca-camera-error-quark`
    Camera,
    /// `uca-plugin-manager-error-quark`
    PluginManager,
    /// `g-io-error-quark`
    Io,
    /// Anything else, typically plugin-specific
    Other,
}

impl ErrorDomain {
    fn of(quark: GQuark) -> Self {
        // SAFETY: quark lookups have no preconditions.
        unsafe {
            if quark == uca_camera_error_quark() {
                ErrorDomain::Camera
            } else if quark == uca_plugin_manager_error_quark() {
                ErrorDomain::PluginManager
            } else if quark == g_io_error_quark() {
                ErrorDomain::Io
            } else {
                ErrorDomain::Other
            }
        }
    }
}

/// Map a native error onto the session's error kinds.
///
/// Errors that carry no recognisable domain/code fall back to the kind the
/// failing operation implies.
pub fn classify_error(
    domain: ErrorDomain,
    code: i32,
    operation: &'static str,
    message: String,
) -> AcquisitionError {
    match (domain, code) {
        (ErrorDomain::Camera, UCA_CAMERA_ERROR_NOT_FOUND) | (ErrorDomain::PluginManager, _) => {
            AcquisitionError::DeviceNotFound {
                camera: String::new(),
                reason: message,
            }
        }
        (ErrorDomain::Camera, UCA_CAMERA_ERROR_RECORDING)
        | (ErrorDomain::Camera, UCA_CAMERA_ERROR_NOT_RECORDING) => {
            AcquisitionError::DeviceState(message)
        }
        (ErrorDomain::Camera, UCA_CAMERA_ERROR_TIMEOUT) | (ErrorDomain::Io, G_IO_ERROR_TIMED_OUT) => {
            AcquisitionError::AcquisitionTimeout(message)
        }
        (ErrorDomain::Io, G_IO_ERROR_HOST_NOT_FOUND)
        | (ErrorDomain::Io, G_IO_ERROR_HOST_UNREACHABLE)
        | (ErrorDomain::Io, G_IO_ERROR_NETWORK_UNREACHABLE)
        | (ErrorDomain::Io, G_IO_ERROR_CONNECTION_REFUSED) => AcquisitionError::Connection(message),
        _ => match operation {
            "connect" => AcquisitionError::Connection(message),
            "start_recording" | "stop_recording" => AcquisitionError::DeviceState(message),
            "grab" => AcquisitionError::AcquisitionTimeout(message),
            _ => AcquisitionError::Hardware { operation, message },
        },
    }
}

/// Take ownership of a `GError`, free it and convert it.
///
/// # Safety
///
/// `error` must be null or a valid `GError` not referenced elsewhere.
unsafe fn take_error(error: *mut GError, operation: &'static str) -> AcquisitionError {
    if error.is_null() {
        return AcquisitionError::Hardware {
            operation,
            message: "failed without reporting an error".into(),
        };
    }
    let domain = ErrorDomain::of((*error).domain);
    let code = (*error).code;
    let message = if (*error).message.is_null() {
        String::new()
    } else {
        CStr::from_ptr((*error).message).to_string_lossy().into_owned()
    };
    g_error_free(error);
    tracing::debug!(operation, ?domain, code, %message, "libuca reported an error");
    classify_error(domain, code, operation, message)
}

fn c_string(value: &str, what: &'static str) -> AppResult<CString> {
    CString::new(value)
        .map_err(|_| AcquisitionError::Configuration(format!("{what} contains a NUL byte")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

impl Access {
    fn allowed_by(self, flags: GParamFlags) -> bool {
        let required = match self {
            Access::Read => G_PARAM_READABLE,
            Access::Write => G_PARAM_WRITABLE,
        };
        flags & required != 0
    }

    fn as_str(self) -> &'static str {
        match self {
            Access::Read => "readable",
            Access::Write => "writable",
        }
    }
}

/// Compare the connect flag read back from the camera with the requested
/// one. `None` means the property cannot be read and is taken on trust.
fn verify_connect(camera: &str, requested: bool, reported: Option<bool>) -> AppResult<()> {
    match reported {
        Some(state) if state != requested => Err(AcquisitionError::Connection(format!(
            "camera '{camera}' did not {}",
            if requested { "connect" } else { "disconnect" }
        ))),
        _ => Ok(()),
    }
}

/// libuca plugin manager.
pub struct UcaPluginManager {
    raw: *mut uca_sys::UcaPluginManager,
}

impl UcaPluginManager {
    /// Create a plugin manager, optionally searching `plugin_dir` first.
    pub fn new(plugin_dir: Option<&Path>) -> AppResult<Self> {
        // SAFETY: plain constructor.
        let raw = unsafe { uca_plugin_manager_new() };
        if raw.is_null() {
            return Err(AcquisitionError::Hardware {
                operation: "plugin_manager_new",
                message: "libuca returned no plugin manager".into(),
            });
        }
        let manager = Self { raw };

        if let Some(dir) = plugin_dir {
            let path = c_string(&dir.to_string_lossy(), "plugin directory")?;
            // SAFETY: `raw` is live and `path` outlives the call.
            unsafe { uca_plugin_manager_add_path(manager.raw, path.as_ptr()) };
            tracing::debug!(dir = %dir.display(), "Added plugin search path");
        }

        Ok(manager)
    }
}

impl Drop for UcaPluginManager {
    fn drop(&mut self) {
        // SAFETY: we hold the only reference.
        unsafe { g_object_unref(self.raw as gpointer) };
    }
}

impl CameraRegistry for UcaPluginManager {
    fn available_cameras(&self) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        // SAFETY: the list and its strings are owned by us and released with
        // g_list_free_full(g_free) after being copied.
        unsafe {
            let list = uca_plugin_manager_get_available_cameras(self.raw);
            let mut node = list;
            while !node.is_null() {
                let data = (*node).data as *const gchar;
                if !data.is_null() {
                    names.push(CStr::from_ptr(data).to_string_lossy().into_owned());
                }
                node = (*node).next;
            }
            if !list.is_null() {
                g_list_free_full(list, Some(g_free));
            }
        }
        Ok(names)
    }

    fn open(&self, name: &str) -> AppResult<Box<dyn Camera>> {
        let cname = c_string(name, "camera identifier")?;
        let mut error: *mut GError = ptr::null_mut();

        // SAFETY: `cname` outlives the call, no construct parameters are passed.
        let raw = unsafe {
            uca_plugin_manager_get_camerav(self.raw, cname.as_ptr(), 0, ptr::null_mut(), &mut error)
        };

        if raw.is_null() {
            // SAFETY: ownership of `error` passes to us on failure.
            let reason = match unsafe { take_error(error, "open") } {
                AcquisitionError::DeviceNotFound { reason, .. } => reason,
                other => other.to_string(),
            };
            return Err(AcquisitionError::DeviceNotFound {
                camera: name.to_string(),
                reason,
            });
        }
        if !error.is_null() {
            // SAFETY: a warning attached to a successful call is still ours to free.
            unsafe { g_error_free(error) };
        }

        tracing::debug!(camera = name, "libuca camera created");
        Ok(Box::new(UcaCamera {
            name: name.to_string(),
            raw,
        }))
    }
}

/// A camera instantiated through libuca.
pub struct UcaCamera {
    name: String,
    raw: *mut uca_sys::UcaCamera,
}

impl UcaCamera {
    fn object(&self) -> gpointer {
        self.raw as gpointer
    }

    fn find_property(&self, property: &'static str) -> AppResult<(CString, GParamFlags)> {
        let cname = c_string(property, "property name")?;
        // SAFETY: every GObject instance starts with a GTypeInstance whose
        // class is a GObjectClass; a returned spec is owned by that class.
        let flags = unsafe {
            let class = (*(self.raw as *mut GTypeInstance)).g_class as *mut GObjectClass;
            let spec = g_object_class_find_property(class, cname.as_ptr());
            if spec.is_null() {
                None
            } else {
                Some((*spec).flags)
            }
        };
        match flags {
            Some(flags) => Ok((cname, flags)),
            None => Err(AcquisitionError::Hardware {
                operation: property,
                message: format!("camera '{}' has no property '{property}'", self.name),
            }),
        }
    }

    fn property(&self, property: &'static str, access: Access) -> AppResult<CString> {
        let (cname, flags) = self.find_property(property)?;
        if !access.allowed_by(flags) {
            return Err(AcquisitionError::Hardware {
                operation: property,
                message: format!(
                    "property '{property}' of camera '{}' is not {}",
                    self.name,
                    access.as_str()
                ),
            });
        }
        Ok(cname)
    }

    fn set_string(&mut self, property: &'static str, value: &str) -> AppResult<()> {
        let name = self.property(property, Access::Write)?;
        let value = c_string(value, property)?;
        // SAFETY: string property, NULL-terminated argument list.
        unsafe {
            g_object_set(
                self.object(),
                name.as_ptr(),
                value.as_ptr(),
                ptr::null::<gchar>(),
            )
        };
        Ok(())
    }

    fn set_bool(&mut self, property: &'static str, value: bool) -> AppResult<()> {
        let name = self.property(property, Access::Write)?;
        let value: gboolean = if value { TRUE } else { FALSE };
        // SAFETY: boolean property, NULL-terminated argument list.
        unsafe { g_object_set(self.object(), name.as_ptr(), value, ptr::null::<gchar>()) };
        Ok(())
    }

    fn get_bool(&self, property: &'static str) -> AppResult<bool> {
        let name = self.property(property, Access::Read)?;
        let mut value: gboolean = FALSE;
        // SAFETY: boolean property written into a gboolean.
        unsafe {
            g_object_get(
                self.object(),
                name.as_ptr(),
                &mut value as *mut gboolean,
                ptr::null::<gchar>(),
            )
        };
        Ok(value != FALSE)
    }

    fn get_uint(&self, property: &'static str) -> AppResult<guint> {
        let name = self.property(property, Access::Read)?;
        let mut value: guint = 0;
        // SAFETY: unsigned property written into a guint.
        unsafe {
            g_object_get(
                self.object(),
                name.as_ptr(),
                &mut value as *mut guint,
                ptr::null::<gchar>(),
            )
        };
        Ok(value)
    }

    fn call(
        &mut self,
        operation: &'static str,
        f: unsafe extern "C" fn(*mut uca_sys::UcaCamera, *mut *mut GError),
    ) -> AppResult<()> {
        let mut error: *mut GError = ptr::null_mut();
        // SAFETY: `raw` is live; libuca sets `error` only on failure.
        unsafe {
            f(self.raw, &mut error);
            if !error.is_null() {
                return Err(take_error(error, operation));
            }
        }
        Ok(())
    }
}

impl Drop for UcaCamera {
    fn drop(&mut self) {
        // SAFETY: we hold the only reference.
        unsafe { g_object_unref(self.object()) };
    }
}

impl Camera for UcaCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_network_address(&mut self, address: &str) -> AppResult<()> {
        self.set_string(PROP_NETWORK_ADDRESS, address)
    }

    fn set_network_interface(&mut self, interface: &str) -> AppResult<()> {
        self.set_string(PROP_NETWORK_INTERFACE, interface)
    }

    fn set_enable_10ge(&mut self, enable: bool) -> AppResult<()> {
        self.set_bool(PROP_ENABLE_10GE, enable)
    }

    fn set_connect(&mut self, connect: bool) -> AppResult<()> {
        self.set_bool(PROP_CONNECT, connect)?;
        let (_, flags) = self.find_property(PROP_CONNECT)?;
        let reported = if Access::Read.allowed_by(flags) {
            Some(self.get_bool(PROP_CONNECT)?)
        } else {
            tracing::debug!(camera = %self.name, "'connect' is write-only, not verified");
            None
        };
        verify_connect(&self.name, connect, reported)
    }

    fn sensor_bitdepth(&self) -> AppResult<u32> {
        self.get_uint(PROP_SENSOR_BITDEPTH)
    }

    fn roi_height(&self) -> AppResult<usize> {
        Ok(self.get_uint(PROP_ROI_HEIGHT)? as usize)
    }

    fn roi_width(&self) -> AppResult<usize> {
        Ok(self.get_uint(PROP_ROI_WIDTH)? as usize)
    }

    fn start_recording(&mut self) -> AppResult<()> {
        self.call("start_recording", uca_camera_start_recording)
    }

    fn grab(&mut self, frame: &mut FrameBuffer) -> AppResult<()> {
        // The plugin writes height * width elements of the sensor's width
        // blindly, so the buffer must match what the camera reports now.
        let expected = self.geometry()?;
        let actual = frame.geometry();
        if actual.height != expected.height
            || actual.width != expected.width
            || actual.pixel_depth() != expected.pixel_depth()
        {
            return Err(AcquisitionError::BufferMismatch { expected, actual });
        }

        let data = match frame.pixels_mut() {
            Pixels::Mono8(a) => a.as_mut_ptr() as gpointer,
            Pixels::Mono16(a) => a.as_mut_ptr() as gpointer,
        };

        let mut error: *mut GError = ptr::null_mut();
        // SAFETY: `data` points at a contiguous buffer sized for the
        // geometry checked above and stays borrowed for the whole call.
        unsafe {
            let ok = uca_camera_grab(self.raw, data, &mut error);
            if ok == FALSE || !error.is_null() {
                return Err(take_error(error, "grab"));
            }
        }
        Ok(())
    }

    fn stop_recording(&mut self) -> AppResult<()> {
        self.call("stop_recording", uca_camera_stop_recording)
    }
}
