//! phantom-acquire: grab a single frame from a network camera.
//!
//! ```bash
//! # discovery, 1G link
//! phantom-acquire
//! # fixed address over 10G, save the frame
//! phantom-acquire -x -e enp1s0 -i 192.168.1.40 -o frame.png
//! ```
//!
//! Without the `uca_hardware` feature only the simulated `mock` camera is
//! available.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

use phantom_acquire::camera::CameraRegistry;
use phantom_acquire::cli::Cli;
use phantom_acquire::config::SessionConfig;
use phantom_acquire::interrupt::InterruptFlag;
use phantom_acquire::logging::build_logger;
use phantom_acquire::session::Orchestrator;
use phantom_acquire::sink::{PngSink, SinkChain, StatsSink, ViewerSink};
use phantom_acquire::AppResult;

#[cfg(feature = "uca_hardware")]
fn open_registry(config: &SessionConfig) -> AppResult<Box<dyn CameraRegistry>> {
    let manager = phantom_acquire::camera::UcaPluginManager::new(config.plugin_dir.as_deref())?;
    Ok(Box::new(manager))
}

#[cfg(not(feature = "uca_hardware"))]
fn open_registry(config: &SessionConfig) -> AppResult<Box<dyn CameraRegistry>> {
    if let Some(dir) = &config.plugin_dir {
        tracing::warn!(dir = %dir.display(), "Built without libuca support, plugin directory ignored");
    }
    Ok(Box::new(phantom_acquire::camera::MockRegistry::default()))
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = SessionConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;

    let logger = build_logger(config.log_level);

    let registry = tracing::dispatcher::with_default(&logger, || {
        let registry = open_registry(&config);
        if let Err(e) = &registry {
            tracing::error!("Failed to initialise camera registry: {e}");
        }
        registry
    });
    let Ok(registry) = registry else {
        return Ok(ExitCode::FAILURE);
    };

    if cli.list {
        let cameras = registry.available_cameras()?;
        for name in cameras {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let interrupt = InterruptFlag::install();
    let mut sink = SinkChain::new().with(StatsSink);
    if let Some(path) = &config.output {
        sink = sink.with(PngSink::new(path));
    }
    if config.show {
        sink = sink.with(ViewerSink::new().with_interrupt(interrupt.clone()));
    }

    let orchestrator = Orchestrator::new(logger).with_interrupt(interrupt);
    // Failures are logged by the orchestrator.
    match orchestrator.run_session(registry.as_ref(), &config, &mut sink) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
