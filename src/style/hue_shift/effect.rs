use image::Rgb32FImage;
use rayon::prelude::*;

use crate::{
    error::TransformError,
    style::traits::AlgorithmMetadata,
    style::{StyleAlgorithm, StyleParameters, StyleReference},
};

use super::DEFAULT_DEGREES;

/// Fixed hue rotation
#[derive(Debug, Clone, Copy)]
pub struct HueShift {
    degrees: f32,
}

impl HueShift {
    pub fn new(degrees: f32) -> Self {
        Self { degrees }
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

impl Default for HueShift {
    fn default() -> Self {
        Self::new(DEFAULT_DEGREES)
    }
}

impl StyleAlgorithm for HueShift {
    fn name(&self) -> &str {
        "hue_shift"
    }

    fn description(&self) -> &str {
        "Rotates the hue of every pixel by a fixed angle"
    }

    fn stylize(
        &self,
        content: &Rgb32FImage,
        _style: &StyleReference,
        _params: &StyleParameters,
    ) -> Result<Rgb32FImage, TransformError> {
        let mut output = content.clone();
        output
            .par_chunks_mut(3)
            .for_each(|pixel| {
                let rotated = rotate_hue([pixel[0], pixel[1], pixel[2]], self.degrees);
                pixel.copy_from_slice(&rotated);
            });
        Ok(output)
    }

    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            iterative: false,
            performance_impact: 0.05,
            parameters: Vec::new(),
        }
    }
}

/// Rotate the hue of a normalized RGB color, keeping saturation and value
fn rotate_hue(rgb: [f32; 3], degrees: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta <= 0.0 {
        return rgb;
    }

    let hue = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let hue = (hue + degrees).rem_euclid(360.0);

    // back to RGB with the same chroma and value
    let x = delta * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match (hue / 60.0) as u32 {
        0 => (delta, x, 0.0),
        1 => (x, delta, 0.0),
        2 => (0.0, delta, x),
        3 => (0.0, x, delta),
        4 => (x, 0.0, delta),
        _ => (delta, 0.0, x),
    };
    [r1 + min, g1 + min, b1 + min]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn assert_close(a: [f32; 3], b: [f32; 3]) {
        for c in 0..3 {
            assert!((a[c] - b[c]).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_rotate_primaries() {
        assert_close(rotate_hue([1.0, 0.0, 0.0], 120.0), [0.0, 1.0, 0.0]);
        assert_close(rotate_hue([0.0, 1.0, 0.0], 120.0), [0.0, 0.0, 1.0]);
        assert_close(rotate_hue([0.0, 0.0, 1.0], 120.0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_negative_and_full_turns() {
        assert_close(rotate_hue([1.0, 0.0, 0.0], -120.0), [0.0, 0.0, 1.0]);
        assert_close(rotate_hue([0.8, 0.4, 0.2], 360.0), [0.8, 0.4, 0.2]);
    }

    #[test]
    fn test_default_rotation() {
        assert_eq!(HueShift::default().degrees(), DEFAULT_DEGREES);
        assert_eq!(HueShift::new(-45.0).degrees(), -45.0);
    }

    #[test]
    fn test_grays_are_unchanged() {
        assert_eq!(rotate_hue([0.3, 0.3, 0.3], 45.0), [0.3, 0.3, 0.3]);
    }

    #[test]
    fn test_stylize_default_shift() {
        let style = StyleReference::from_rgb(&RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])), "s").unwrap();
        let content = Rgb32FImage::from_pixel(2, 2, Rgb([1.0, 0.0, 0.0]));

        let output = HueShift::default()
            .stylize(&content, &style, &StyleParameters::default())
            .unwrap();

        // 20 degrees from red: green rises to a third of full
        assert_close(output.get_pixel(1, 1).0, [1.0, 1.0 / 3.0, 0.0]);
    }
}
