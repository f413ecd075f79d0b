//! Frame presentation.
//!
//! After the grab the session hands the populated buffer to a [`FrameSink`].
//! Sinks borrow the frame; the buffer stays owned by the session and is
//! returned in its report.

use image::{ImageBuffer, Luma};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::error::{AcquisitionError, AppResult};
use crate::frame::{FrameBuffer, Pixels, MAX_BITDEPTH};
use crate::interrupt::InterruptFlag;

/// Receives the grabbed frame.
pub trait FrameSink {
    /// Present `frame`. May block, e.g. until a viewer is dismissed.
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()>;
}

/// Logs frame statistics at info level.
#[derive(Debug, Default)]
pub struct StatsSink;

impl FrameSink for StatsSink {
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()> {
        let (rows, columns) = frame.dim();
        let stats = frame.stats();
        tracing::info!(
            rows,
            columns,
            depth = frame.pixel_depth().as_str(),
            min = stats.min,
            max = stats.max,
            mean = stats.mean,
            "Frame {}",
            stats
        );
        Ok(())
    }
}

/// Encode `frame` as a grayscale PNG at `path`.
///
/// 16-bit buffers from sensors narrower than 16 bits are shifted up so the
/// image spans the full intensity range. Values above the sensor's range are
/// clamped to its maximum first.
pub fn write_png(frame: &FrameBuffer, path: &Path) -> AppResult<()> {
    let (rows, columns) = frame.dim();
    let (width, height) = (columns as u32, rows as u32);
    let shape_error = || {
        AcquisitionError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {rows}x{columns} pixels cannot be encoded"),
        ))
    };

    match frame.pixels() {
        Pixels::Mono8(a) => {
            let raw: Vec<u8> = a.iter().copied().collect();
            let img = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, raw)
                .ok_or_else(shape_error)?;
            img.save(path)?;
        }
        Pixels::Mono16(a) => {
            let shift = MAX_BITDEPTH - frame.bitdepth().clamp(1, MAX_BITDEPTH);
            let max = u16::MAX >> shift;
            let raw: Vec<u16> = a.iter().map(|&v| v.min(max) << shift).collect();
            let img = ImageBuffer::<Luma<u16>, _>::from_raw(width, height, raw)
                .ok_or_else(shape_error)?;
            img.save(path)?;
        }
    }
    tracing::debug!(path = %path.display(), "Wrote PNG");
    Ok(())
}

/// Writes the frame to a PNG file.
#[derive(Debug)]
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    /// Sink writing to `path`, overwriting any existing file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()> {
        write_png(frame, &self.path)?;
        tracing::info!(path = %self.path.display(), "Frame saved");
        Ok(())
    }
}

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Launcher = Box<dyn FnMut(&Path) -> io::Result<()>>;

/// Shows the frame in the system image viewer and waits for the user.
///
/// The image is written to a temporary directory that is removed once the
/// user has pressed Enter. Input is read on a helper thread so the wait also
/// ends when the interrupt flag is raised.
pub struct ViewerSink {
    input: Option<Box<dyn BufRead + Send>>,
    lines: Option<mpsc::Receiver<io::Result<usize>>>,
    launcher: Launcher,
    interrupt: Option<InterruptFlag>,
}

impl std::fmt::Debug for ViewerSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSink")
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

impl Default for ViewerSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSink {
    /// Viewer opened with the system default application and dismissed
    /// through standard input.
    pub fn new() -> Self {
        Self {
            input: Some(Box::new(io::BufReader::new(io::stdin()))),
            lines: None,
            launcher: Box::new(|path: &Path| opener::open(path).map_err(io::Error::other)),
            interrupt: None,
        }
    }

    /// Dismiss the viewer with a line read from `input` instead of stdin.
    pub fn with_input(mut self, input: Box<dyn BufRead + Send>) -> Self {
        self.input = Some(input);
        self
    }

    /// Open the image with `launcher` instead of the system viewer.
    pub fn with_launcher(mut self, launcher: impl FnMut(&Path) -> io::Result<()> + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Stop waiting once `flag` is raised.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt.as_ref().is_some_and(InterruptFlag::is_raised)
    }

    fn spawn_reader(&mut self) -> io::Result<()> {
        if self.lines.is_some() {
            return Ok(());
        }
        let mut input = self
            .input
            .take()
            .unwrap_or_else(|| Box::new(io::BufReader::new(io::stdin())));
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("viewer input".to_string())
            .spawn(move || loop {
                let mut line = String::new();
                let read = input.read_line(&mut line);
                let done = matches!(read, Ok(0) | Err(_));
                if tx.send(read).is_err() || done {
                    break;
                }
            })?;
        self.lines = Some(rx);
        Ok(())
    }

    fn wait_for_dismissal(&mut self) -> AppResult<()> {
        self.spawn_reader()?;
        let Some(lines) = self.lines.as_ref() else {
            return Ok(());
        };
        loop {
            if self.interrupted() {
                return Err(AcquisitionError::Interrupted);
            }
            match lines.recv_timeout(INPUT_POLL_INTERVAL) {
                Ok(read) => {
                    read?;
                    if self.interrupted() {
                        return Err(AcquisitionError::Interrupted);
                    }
                    return Ok(());
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                // Input closed: nothing left to wait for.
                Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }
}

impl FrameSink for ViewerSink {
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.png");
        write_png(frame, &path)?;

        (self.launcher)(&path)?;
        tracing::info!("Showing frame, press Enter to continue");

        self.wait_for_dismissal()
    }
}

/// Presents a frame to several sinks in order, stopping at the first error.
#[derive(Default)]
pub struct SinkChain {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl SinkChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink.
    pub fn with(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the chain has no sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FrameSink for SinkChain {
    fn present(&mut self, frame: &FrameBuffer) -> AppResult<()> {
        for sink in &mut self.sinks {
            sink.present(frame)?;
        }
        Ok(())
    }
}
