//! Receive buffers for single-frame grabs.
//!
//! A [`FrameBuffer`] is allocated from the [`FrameGeometry`] the camera
//! reports once it is connected and recording. Its element width follows the
//! sensor bit depth: up to 8 bits are stored as `u8`, anything wider as `u16`.

use ndarray::Array2;
use std::fmt;

/// Widest sensor the 16-bit buffer layout can hold.
pub const MAX_BITDEPTH: u32 = 16;

/// Element width of a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelDepth {
    /// 8-bit unsigned elements
    Mono8,
    /// 16-bit unsigned elements
    Mono16,
}

impl PixelDepth {
    /// Pick the element width for a sensor bit depth.
    pub fn from_bitdepth(bitdepth: u32) -> Self {
        if bitdepth > 8 {
            PixelDepth::Mono16
        } else {
            PixelDepth::Mono8
        }
    }

    /// Bytes per element.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelDepth::Mono8 => 1,
            PixelDepth::Mono16 => 2,
        }
    }

    /// Short name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            PixelDepth::Mono8 => "Mono8",
            PixelDepth::Mono16 => "Mono16",
        }
    }
}

/// Sensor bit depth and region of interest, as queried from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Sensor bit depth
    pub bitdepth: u32,
    /// ROI height in rows
    pub height: usize,
    /// ROI width in columns
    pub width: usize,
}

impl FrameGeometry {
    /// Create a geometry from bit depth and ROI dimensions.
    pub fn new(bitdepth: u32, height: usize, width: usize) -> Self {
        Self {
            bitdepth,
            height,
            width,
        }
    }

    /// Element width a buffer for this geometry must use.
    pub fn pixel_depth(&self) -> PixelDepth {
        PixelDepth::from_bitdepth(self.bitdepth)
    }

    /// Number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Size of one frame in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.pixel_depth().bytes_per_pixel()
    }

    /// Check that a buffer can be allocated and filled for this geometry.
    pub fn validate(&self) -> Result<(), String> {
        if self.bitdepth == 0 || self.bitdepth > MAX_BITDEPTH {
            return Err(format!(
                "sensor bit depth {} outside supported range 1..={}",
                self.bitdepth, MAX_BITDEPTH
            ));
        }
        if self.height == 0 || self.width == 0 {
            return Err(format!(
                "empty region of interest ({}x{})",
                self.height, self.width
            ));
        }
        Ok(())
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {} bit", self.height, self.width, self.bitdepth)
    }
}

/// Pixel storage of a [`FrameBuffer`], indexed `[row, column]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    /// Sensors up to 8 bits
    Mono8(Array2<u8>),
    /// Sensors wider than 8 bits
    Mono16(Array2<u16>),
}

/// Zero-initialized receive buffer owned by the session.
///
/// Cameras fill it in place through `Camera::grab(&mut FrameBuffer)`; the
/// buffer never leaves the caller's ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    bitdepth: u32,
    pixels: Pixels,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `height x width` elements of the width
    /// required by `geometry.bitdepth`.
    pub fn zeroed(geometry: FrameGeometry) -> Self {
        let shape = (geometry.height, geometry.width);
        let pixels = match geometry.pixel_depth() {
            PixelDepth::Mono8 => Pixels::Mono8(Array2::zeros(shape)),
            PixelDepth::Mono16 => Pixels::Mono16(Array2::zeros(shape)),
        };
        Self {
            bitdepth: geometry.bitdepth,
            pixels,
        }
    }

    /// Geometry this buffer was allocated for.
    pub fn geometry(&self) -> FrameGeometry {
        let (height, width) = self.dim();
        FrameGeometry::new(self.bitdepth, height, width)
    }

    /// Sensor bit depth the buffer was allocated for.
    pub fn bitdepth(&self) -> u32 {
        self.bitdepth
    }

    /// Element width.
    pub fn pixel_depth(&self) -> PixelDepth {
        match self.pixels {
            Pixels::Mono8(_) => PixelDepth::Mono8,
            Pixels::Mono16(_) => PixelDepth::Mono16,
        }
    }

    /// `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        match &self.pixels {
            Pixels::Mono8(a) => a.dim(),
            Pixels::Mono16(a) => a.dim(),
        }
    }

    /// Read access to the pixel array.
    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    /// Write access to the pixel array, for cameras filling the buffer.
    pub fn pixels_mut(&mut self) -> &mut Pixels {
        &mut self.pixels
    }

    /// Address of the first pixel. Stable for the lifetime of the buffer.
    pub fn data_address(&self) -> usize {
        match &self.pixels {
            Pixels::Mono8(a) => a.as_ptr() as usize,
            Pixels::Mono16(a) => a.as_ptr() as usize,
        }
    }

    /// Pixel value at `(row, column)` widened to `u32`.
    pub fn get(&self, row: usize, column: usize) -> Option<u32> {
        match &self.pixels {
            Pixels::Mono8(a) => a.get((row, column)).map(|&v| u32::from(v)),
            Pixels::Mono16(a) => a.get((row, column)).map(|&v| u32::from(v)),
        }
    }

    /// Whether every pixel is zero.
    pub fn is_blank(&self) -> bool {
        match &self.pixels {
            Pixels::Mono8(a) => a.iter().all(|&v| v == 0),
            Pixels::Mono16(a) => a.iter().all(|&v| v == 0),
        }
    }

    /// Intensity statistics over the whole frame.
    pub fn stats(&self) -> FrameStats {
        match &self.pixels {
            Pixels::Mono8(a) => FrameStats::from_values(a.iter().map(|&v| u32::from(v))),
            Pixels::Mono16(a) => FrameStats::from_values(a.iter().map(|&v| u32::from(v))),
        }
    }
}

/// Minimum, maximum and mean intensity of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Smallest pixel value
    pub min: u32,
    /// Largest pixel value
    pub max: u32,
    /// Mean pixel value
    pub mean: f64,
}

impl FrameStats {
    fn from_values(values: impl Iterator<Item = u32>) -> Self {
        let mut count = 0u64;
        let mut sum = 0u64;
        let mut min = u32::MAX;
        let mut max = 0u32;
        for v in values {
            count += 1;
            sum += u64::from(v);
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self {
                min: 0,
                max: 0,
                mean: 0.0,
            };
        }
        Self {
            min,
            max,
            mean: sum as f64 / count as f64,
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min={} max={} mean={:.2}",
            self.min, self.max, self.mean
        )
    }
}
