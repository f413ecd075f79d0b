//! Logger construction.
//!
//! The process builds one [`Dispatch`] from the configured [`LogLevel`] and
//! hands it to the [`Orchestrator`](crate::session::Orchestrator), which
//! installs it only for the duration of a session. Nothing here touches the
//! global default subscriber.

use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Build the stderr logger for the command-line tool.
///
/// `RUST_LOG` directives refine the configured level, e.g.
/// `RUST_LOG=phantom_acquire::camera=trace`.
pub fn build_logger(level: LogLevel) -> Dispatch {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    Dispatch::new(subscriber)
}

/// Build a logger writing plain text to `writer` at exactly `level`.
///
/// Used where output must be captured, such as tests.
pub fn build_logger_with_writer<W>(level: LogLevel, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .finish();

    Dispatch::new(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::INFO);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn test_writer_logger_filters_by_level() {
        let captured = Captured::default();
        let sink = captured.clone();
        let logger = build_logger_with_writer(LogLevel::Info, move || sink.clone());

        tracing::dispatcher::with_default(&logger, || {
            tracing::debug!("hidden detail");
            tracing::info!("visible progress");
        });

        let text = captured.text();
        assert!(text.contains("visible progress"), "{text}");
        assert!(!text.contains("hidden detail"), "{text}");
    }

    #[test]
    fn test_error_level_suppresses_info() {
        let captured = Captured::default();
        let sink = captured.clone();
        let logger = build_logger_with_writer(LogLevel::Error, move || sink.clone());

        tracing::dispatcher::with_default(&logger, || {
            tracing::info!("progress");
            tracing::error!("failure");
        });

        let text = captured.text();
        assert!(text.contains("failure"));
        assert!(!text.contains("progress"));
    }
}
