//! Numeric boundary of the style transform.
//!
//! `preprocess` and `postprocess` convert between 8-bit frames and the
//! normalized float images the algorithms work on. The statistics helpers
//! are shared by the algorithms and by [`StyleReference`](super::StyleReference),
//! which computes the style's statistics once at load time.
//!
//! Parallel reductions here are computed per row and summed in row order, so
//! results are bit-identical whatever the thread count.

use image::{Rgb, Rgb32FImage, RgbImage};
use rayon::prelude::*;

use crate::video::types::Frame;

/// Per-pixel feature vector: RGB, horizontal differences, vertical differences
pub const FEATURES: usize = 9;

/// N-normalized feature Gram matrix
pub type Gram = [[f64; FEATURES]; FEATURES];

/// Convert an 8-bit frame to floats in [0, 1]
pub fn preprocess(frame: &Frame) -> Rgb32FImage {
    let image = frame.as_image();
    Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb(image.get_pixel(x, y).0.map(|c| c as f32 / 255.0))
    })
}

/// Convert floats back to 8 bits, scaling by 255, rounding and clamping
pub fn postprocess(image: &Rgb32FImage) -> Frame {
    let frame = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb(image.get_pixel(x, y).0.map(to_u8))
    });
    Frame::new(frame)
}

fn to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Statistics of a style image that algorithms match against
#[derive(Debug, Clone, PartialEq)]
pub struct StyleStatistics {
    pub mean: [f64; 3],
    pub std_dev: [f64; 3],
    pub gram: Gram,
}

impl StyleStatistics {
    pub fn from_image(image: &Rgb32FImage) -> Self {
        let (mean, std_dev) = channel_moments(image);
        let (width, height) = image.dimensions();
        Self {
            mean,
            std_dev,
            gram: feature_gram(image.as_raw(), width as usize, height as usize),
        }
    }
}

/// Per-channel mean and standard deviation
pub fn channel_moments(image: &Rgb32FImage) -> ([f64; 3], [f64; 3]) {
    let count = (image.width() as usize * image.height() as usize) as f64;
    if count == 0.0 {
        return ([0.0; 3], [0.0; 3]);
    }

    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    for pixel in image.pixels() {
        for c in 0..3 {
            let v = pixel.0[c] as f64;
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }

    let mean = sum.map(|s| s / count);
    let mut std_dev = [0.0; 3];
    for c in 0..3 {
        std_dev[c] = (sum_sq[c] / count - mean[c] * mean[c]).max(0.0).sqrt();
    }
    (mean, std_dev)
}

/// Feature vector of pixel (x, y) in a packed RGB float buffer
///
/// Differences are forward differences; they are zero on the last column
/// (horizontal) and the last row (vertical).
#[inline]
pub fn pixel_features(data: &[f32], width: usize, height: usize, x: usize, y: usize) -> [f32; FEATURES] {
    let i = (y * width + x) * 3;
    let mut f = [0.0f32; FEATURES];
    for c in 0..3 {
        let v = data[i + c];
        f[c] = v;
        if x + 1 < width {
            f[3 + c] = data[i + 3 + c] - v;
        }
        if y + 1 < height {
            f[6 + c] = data[i + width * 3 + c] - v;
        }
    }
    f
}

/// Gram matrix `(1/N) Σ f fᵀ` over all pixels of a packed RGB float buffer
pub fn feature_gram(data: &[f32], width: usize, height: usize) -> Gram {
    let mut gram = [[0.0f64; FEATURES]; FEATURES];
    let count = width * height;
    if count == 0 {
        return gram;
    }

    let rows: Vec<Gram> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut acc = [[0.0f64; FEATURES]; FEATURES];
            for x in 0..width {
                let f = pixel_features(data, width, height, x, y);
                for i in 0..FEATURES {
                    let fi = f[i] as f64;
                    for j in i..FEATURES {
                        acc[i][j] += fi * f[j] as f64;
                    }
                }
            }
            acc
        })
        .collect();

    for row in &rows {
        for i in 0..FEATURES {
            for j in i..FEATURES {
                gram[i][j] += row[i][j];
            }
        }
    }

    let norm = count as f64;
    for i in 0..FEATURES {
        for j in i..FEATURES {
            gram[i][j] /= norm;
            gram[j][i] = gram[i][j];
        }
    }
    gram
}
