//! Session configuration using Figment
//!
//! Configuration is merged from, in increasing order of precedence:
//! 1. Built-in defaults (`SessionConfig::default()`)
//! 2. An optional TOML file (`--config session.toml`)
//! 3. Environment variables prefixed with `PHANTOM_`
//! 4. Command-line flags
//!
//! # Environment Variable Overrides
//!
//! ```text
//! PHANTOM_NETWORK_ADDRESS=192.168.1.40
//! PHANTOM_ENABLE_10GE=true
//! PHANTOM_NETWORK_INTERFACE=enp1s0
//! PHANTOM_LOG_LEVEL=DEBUG
//! ```
//!
//! # Example file
//!
//! ```toml
//! camera = "phantom"
//! network_address = ""        # empty: UDP discovery
//! enable_10ge = true
//! network_interface = "enp1s0"
//! log_level = "INFO"
//! ```
//!
//! The merged configuration is validated once and then treated as immutable
//! for the rest of the process.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::error::{AcquisitionError, AppResult};

/// Registry identifier of the Phantom camera plugin.
pub const DEFAULT_CAMERA: &str = "phantom";

/// Interface used for 10G links when none is configured.
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "PHANTOM_";

/// Log verbosity accepted on the command line.
///
/// Parsing is case-insensitive and falls back to [`LogLevel::Info`] for
/// anything unrecognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// Every step of the session
    Debug,
    /// Progress messages
    #[default]
    Info,
    /// Failures only
    Error,
}

impl LogLevel {
    /// Parse a level name, falling back to `Info`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        LogLevel::parse_lossy(&s)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one acquisition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Registry identifier of the camera plugin
    pub camera: String,
    /// Camera IP address; empty selects discovery mode
    pub network_address: String,
    /// Host interface the camera's 10G link is attached to
    pub network_interface: String,
    /// Use the 10G data link
    pub enable_10ge: bool,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Extra directory searched for camera plugins
    pub plugin_dir: Option<PathBuf>,
    /// Write the grabbed frame to this PNG file
    pub output: Option<PathBuf>,
    /// Open the grabbed frame in the system image viewer
    pub show: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera: DEFAULT_CAMERA.to_string(),
            network_address: String::new(),
            network_interface: DEFAULT_INTERFACE.to_string(),
            enable_10ge: false,
            log_level: LogLevel::Info,
            plugin_dir: None,
            output: None,
            show: false,
        }
    }
}

/// Values supplied on the command line. `None` leaves lower layers in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigOverrides {
    /// See [`SessionConfig::camera`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    /// See [`SessionConfig::network_address`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_address: Option<String>,
    /// See [`SessionConfig::network_interface`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_interface: Option<String>,
    /// See [`SessionConfig::enable_10ge`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_10ge: Option<bool>,
    /// See [`SessionConfig::log_level`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// See [`SessionConfig::plugin_dir`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<PathBuf>,
    /// See [`SessionConfig::output`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// See [`SessionConfig::show`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
}

impl SessionConfig {
    /// Build the layered provider without extracting it.
    pub fn figment(file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SessionConfig::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Load and validate the configuration.
    ///
    /// An explicitly named file must exist; a missing file is an error rather
    /// than an empty layer.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> AppResult<Self> {
        if let Some(path) = file {
            if !path.is_file() {
                return Err(AcquisitionError::Configuration(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
        }
        let config: SessionConfig = Self::figment(file, overrides).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints that parsing cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.camera.trim().is_empty() {
            return Err(AcquisitionError::Configuration(
                "camera identifier must not be empty".into(),
            ));
        }

        if !self.network_address.is_empty() && self.network_address.parse::<IpAddr>().is_err() {
            return Err(AcquisitionError::Configuration(format!(
                "'{}' is not a valid IP address (leave empty to use discovery)",
                self.network_address
            )));
        }

        if self.enable_10ge && self.network_interface.trim().is_empty() {
            return Err(AcquisitionError::Configuration(
                "10G mode requires a network interface name".into(),
            ));
        }

        Ok(())
    }

    /// Whether the camera is located by discovery rather than by address.
    pub fn uses_discovery(&self) -> bool {
        self.network_address.is_empty()
    }
}
