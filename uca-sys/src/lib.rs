//! Raw FFI declarations for libuca.
//!
//! Only the plugin-manager and camera entry points needed for single-frame
//! acquisition are declared, together with the GLib/GObject helpers they
//! depend on. Link directives are emitted by `build.rs` when the `uca-sdk`
//! feature is enabled.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub type gchar = c_char;
pub type gint = c_int;
pub type guint = c_uint;
pub type gboolean = c_int;
pub type gpointer = *mut c_void;
pub type GQuark = u32;
pub type GDestroyNotify = Option<unsafe extern "C" fn(data: gpointer)>;

pub const FALSE: gboolean = 0;
pub const TRUE: gboolean = 1;

/// `GError` as laid out by GLib.
#[repr(C)]
pub struct GError {
    pub domain: GQuark,
    pub code: gint,
    pub message: *mut gchar,
}

/// Doubly linked list node as laid out by GLib.
#[repr(C)]
pub struct GList {
    pub data: gpointer,
    pub next: *mut GList,
    pub prev: *mut GList,
}

/// First member of every GObject instance; gives access to its class.
#[repr(C)]
pub struct GTypeInstance {
    pub g_class: *mut GTypeClass,
}

#[repr(C)]
pub struct GTypeClass {
    _private: [u8; 0],
}

#[repr(C)]
pub struct GObjectClass {
    _private: [u8; 0],
}

pub type GType = usize;
pub type GParamFlags = c_uint;

pub const G_PARAM_READABLE: GParamFlags = 1 << 0;
pub const G_PARAM_WRITABLE: GParamFlags = 1 << 1;

/// Public head of `GParamSpec` (gparam.h); only read, never allocated here.
#[repr(C)]
pub struct GParamSpec {
    pub g_type_instance: GTypeInstance,
    pub name: *const gchar,
    pub flags: GParamFlags,
    pub value_type: GType,
    pub owner_type: GType,
}

#[repr(C)]
pub struct GParameter {
    _private: [u8; 0],
}

#[repr(C)]
pub struct UcaPluginManager {
    _private: [u8; 0],
}

#[repr(C)]
pub struct UcaCamera {
    _private: [u8; 0],
}

// UcaCameraError (uca-camera.h)
pub const UCA_CAMERA_ERROR_NOT_FOUND: gint = 0;
pub const UCA_CAMERA_ERROR_RECORDING: gint = 1;
pub const UCA_CAMERA_ERROR_NOT_RECORDING: gint = 2;
pub const UCA_CAMERA_ERROR_TIMEOUT: gint = 7;

// GIOErrorEnum subset (gioenums.h)
pub const G_IO_ERROR_TIMED_OUT: gint = 24;
pub const G_IO_ERROR_HOST_NOT_FOUND: gint = 28;
pub const G_IO_ERROR_HOST_UNREACHABLE: gint = 37;
pub const G_IO_ERROR_NETWORK_UNREACHABLE: gint = 38;
pub const G_IO_ERROR_CONNECTION_REFUSED: gint = 39;

extern "C" {
    // uca-plugin-manager.h
    pub fn uca_plugin_manager_new() -> *mut UcaPluginManager;
    pub fn uca_plugin_manager_add_path(manager: *mut UcaPluginManager, path: *const gchar);
    pub fn uca_plugin_manager_get_available_cameras(manager: *mut UcaPluginManager)
        -> *mut GList;
    pub fn uca_plugin_manager_get_camerav(
        manager: *mut UcaPluginManager,
        name: *const gchar,
        n_parameters: guint,
        parameters: *mut GParameter,
        error: *mut *mut GError,
    ) -> *mut UcaCamera;
    pub fn uca_plugin_manager_error_quark() -> GQuark;

    // uca-camera.h
    pub fn uca_camera_start_recording(camera: *mut UcaCamera, error: *mut *mut GError);
    pub fn uca_camera_stop_recording(camera: *mut UcaCamera, error: *mut *mut GError);
    pub fn uca_camera_grab(camera: *mut UcaCamera, data: gpointer, error: *mut *mut GError)
        -> gboolean;
    pub fn uca_camera_error_quark() -> GQuark;

    // gobject
    pub fn g_object_set(object: gpointer, first_property_name: *const gchar, ...);
    pub fn g_object_get(object: gpointer, first_property_name: *const gchar, ...);
    pub fn g_object_unref(object: gpointer);
    pub fn g_object_class_find_property(
        oclass: *mut GObjectClass,
        property_name: *const gchar,
    ) -> *mut GParamSpec;

    // glib / gio
    pub fn g_error_free(error: *mut GError);
    pub fn g_list_free_full(list: *mut GList, free_func: GDestroyNotify);
    pub fn g_free(mem: gpointer);
    pub fn g_io_error_quark() -> GQuark;
}
