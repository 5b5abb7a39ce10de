//! Frame type representing a captured image with metadata.

use std::time::Instant;

/// A single captured frame from a camera device.
///
/// Holds raw RGB8 pixel data in row-major order. Frames are transient:
/// they are encoded to JPEG for streaming or still output and then dropped,
/// never persisted in this form.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGB8 pixel data, 3 bytes per pixel, row-major.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number within one device session.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the frame, returning the pixel buffer.
    #[inline]
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches the dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * 3
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
