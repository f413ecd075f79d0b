//! User interruption.
//!
//! The first Ctrl+C only raises a flag. The session checks it between steps
//! and the viewer polls it while waiting for the user, so recording is still
//! stopped. A native call that is already blocking (connect, grab) runs to
//! completion before the first interruption takes effect; a second Ctrl+C
//! terminates the process immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Exit status used when a repeated Ctrl+C terminates the process.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Shared "stop requested" flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicUsize>);

impl InterruptFlag {
    /// A lowered flag not connected to any signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag raised by Ctrl+C.
    ///
    /// The handler is process-wide and can be installed once; a second
    /// installation is logged and the returned flag is then only raised
    /// programmatically.
    pub fn install() -> Self {
        let flag = Self::new();
        let handler_flag = flag.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            if handler_flag.raise() > 1 {
                eprintln!("Interrupted again, exiting");
                std::process::exit(EXIT_INTERRUPTED);
            }
            eprintln!("Interrupt received, finishing current step (Ctrl+C again to force exit)");
        }) {
            tracing::warn!("Failed to install Ctrl+C handler: {err}");
        }
        flag
    }

    /// Request a stop. Returns how many times stop has been requested.
    pub fn raise(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a stop was requested.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}
