//! Command-line interface.
//!
//! Flags left out do not override the configuration file or `PHANTOM_*`
//! environment variables; the documented defaults come from
//! [`SessionConfig::default`](crate::config::SessionConfig).

use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// Grab a single frame from a Phantom camera.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about)]
pub struct Cli {
    /// Use the 10G data link.
    #[arg(short = 'x', long)]
    pub xnetwork: bool,

    /// Host interface of the 10G link [default: eth0].
    #[arg(short = 'e', long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Camera IP address. Leave empty to use discovery [default: ""].
    #[arg(short = 'i', long, value_name = "ADDR")]
    pub ip: Option<String>,

    /// Log level: DEBUG, INFO or ERROR [default: INFO].
    #[arg(short = 'l', long, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Camera plugin identifier [default: phantom].
    #[arg(short = 'c', long, value_name = "ID")]
    pub camera: Option<String>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE", env = "PHANTOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra directory searched for camera plugins.
    #[arg(long, value_name = "DIR")]
    pub plugin_dir: Option<PathBuf>,

    /// Save the grabbed frame as PNG.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show the grabbed frame and wait for Enter.
    #[arg(long)]
    pub show: bool,

    /// List available cameras and exit.
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Configuration values given on the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            camera: self.camera.clone(),
            network_address: self.ip.clone(),
            network_interface: self.interface.clone(),
            enable_10ge: self.xnetwork.then_some(true),
            log_level: self.log.clone(),
            plugin_dir: self.plugin_dir.clone(),
            output: self.output.clone(),
            show: self.show.then_some(true),
        }
    }
}
