use image::{ImageBuffer, Rgb, RgbImage};

/// Represents a single video frame
///
/// This is a thin wrapper around an 8-bit RGB image buffer. The raw byte
/// layout (row-major, 3 bytes per pixel, no padding) is exactly what the
/// rawvideo `rgb24` pipes to and from ffmpeg carry.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Consume the frame, returning the underlying image buffer
    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    /// Borrow the raw RGB bytes
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    ///
    /// Returns `None` when `data` is not exactly `width * height * 3` bytes.
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::byte_len(width, height) {
            return None;
        }
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Number of bytes in one rgb24 frame of the given size
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// Mean absolute per-channel difference against another frame of the same size
    pub fn mean_abs_diff(&self, other: &Frame) -> Option<f64> {
        if self.dimensions() != other.dimensions() || self.as_rgb_bytes().is_empty() {
            return None;
        }
        let total: u64 = self
            .as_rgb_bytes()
            .iter()
            .zip(other.as_rgb_bytes())
            .map(|(&a, &b)| a.abs_diff(b) as u64)
            .sum();
        Some(total as f64 / self.as_rgb_bytes().len() as f64)
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Container metadata captured when a video is opened
///
/// `frame_count` is whatever the container advertises and may be 0 or
/// inaccurate; it is only suitable for progress reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    pub frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    /// Seconds, 0.0 if unknown
    pub duration: f64,
}

impl VideoMetadata {
    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether this describes a usable stream
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.fps > 0.0 && self.fps.is_finite()
    }
}
