//! Synthetic test media: deterministic frames, style images and short videos.
//!
//! Used by the smoke binaries, the benchmarks and the integration tests so
//! nothing depends on checked-in media files.

use std::path::Path;

use image::{Rgb, RgbImage};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::debug;

use crate::config::VideoConfig;
use crate::error::Result;
use crate::video::{sink::VideoSink, types::Frame};

/// A colorful frame whose hue drifts with `index`
///
/// Consecutive frames differ, and no frame is a flat color, so both the
/// color and gradient statistics are non-trivial.
pub fn test_frame(width: u32, height: u32, index: u32) -> Frame {
    let base_hue = (index as f32 * 25.0) % 360.0;
    let mut image = RgbImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let hue = (base_hue + 120.0 * x as f32 / width.max(1) as f32) % 360.0;
        let value = 0.45 + 0.5 * y as f32 / height.max(1) as f32;
        let mut color = hsv_to_rgb(hue, 0.7, value);
        // a checker overlay gives the frame some texture
        if (x / 16 + y / 16 + index) % 2 == 0 {
            color = color.map(|c| c.saturating_sub(40));
        }
        *pixel = Rgb(color);
    }

    Frame::new(image)
}

/// A style image with blocky shapes and seeded grain
pub fn test_style_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = SmallRng::seed_from_u64(seed);
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 / 5.0;

    RgbImage::from_fn(width, height, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        let inside_rect = x > width / 5 && x < width * 4 / 5 && y > height / 5 && y < height * 4 / 5;
        let inside_circle = (fx - cx).powi(2) + (fy - cy).powi(2) < radius * radius;

        let base: [u8; 3] = if inside_circle {
            [50, 200, 100]
        } else if inside_rect {
            [100, 50, 200]
        } else {
            [150, 100, 50]
        };

        let grain: i16 = rng.gen_range(-40..=40);
        Rgb(base.map(|c| (c as i16 + grain).clamp(0, 255) as u8))
    })
}

/// Write [`test_style_image`] to disk; the format follows the extension
pub fn write_style_image<P: AsRef<Path>>(path: P, width: u32, height: u32, seed: u64) -> Result<()> {
    test_style_image(width, height, seed)
        .save(path.as_ref())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(())
}

/// Encode `frame_count` [`test_frame`]s into a video at `path`
pub fn write_test_video<P: AsRef<Path>>(
    config: &VideoConfig,
    path: P,
    frame_count: u32,
    width: u32,
    height: u32,
    fps: f64,
) -> Result<u64> {
    let mut sink = VideoSink::new(config);
    sink.open(path.as_ref(), fps, width, height)?;

    for index in 0..frame_count {
        sink.write_frame(&test_frame(width, height, index))?;
    }
    sink.close()?;

    debug!("Wrote {} synthetic frames to {}", sink.frames_written(), path.as_ref().display());
    Ok(sink.frames_written())
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}
