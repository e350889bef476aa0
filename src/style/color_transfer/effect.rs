use image::Rgb32FImage;

use crate::{
    error::TransformError,
    style::numeric::channel_moments,
    style::traits::AlgorithmMetadata,
    style::{StyleAlgorithm, StyleParameters, StyleReference},
};

use super::MIN_STD_DEV;

/// Per-channel mean and standard deviation matching
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorTransfer;

impl ColorTransfer {
    /// Share of the transferred colors in the output
    ///
    /// `style_weight / (style_weight + content_weight)`, or full transfer when
    /// the weights do not give a usable ratio.
    pub fn blend_factor(params: &StyleParameters) -> f32 {
        let total = params.style_weight + params.content_weight;
        if total > 0.0 && total.is_finite() {
            (params.style_weight / total).clamp(0.0, 1.0) as f32
        } else {
            1.0
        }
    }
}

impl StyleAlgorithm for ColorTransfer {
    fn name(&self) -> &str {
        "color_transfer"
    }

    fn description(&self) -> &str {
        "Matches the per-channel color mean and contrast of the style"
    }

    fn stylize(
        &self,
        content: &Rgb32FImage,
        style: &StyleReference,
        params: &StyleParameters,
    ) -> Result<Rgb32FImage, TransformError> {
        let (mean, std_dev) = channel_moments(content);
        let target = style.statistics();
        let alpha = Self::blend_factor(params);

        let mut scale = [1.0f32; 3];
        let mut offset = [0.0f32; 3];
        for c in 0..3 {
            let gain = if std_dev[c] > MIN_STD_DEV {
                target.std_dev[c] / std_dev[c]
            } else {
                1.0
            };
            // transferred = (v - mean) * gain + target_mean
            scale[c] = gain as f32;
            offset[c] = (target.mean[c] - mean[c] * gain) as f32;
        }

        let mut output = content.clone();
        for pixel in output.pixels_mut() {
            for c in 0..3 {
                let v = pixel.0[c];
                let transferred = v * scale[c] + offset[c];
                pixel.0[c] = (v + alpha * (transferred - v)).clamp(0.0, 1.0);
            }
        }
        Ok(output)
    }

    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            iterative: false,
            performance_impact: 0.1,
            parameters: vec![
                ("style_weight".to_string(), "Share of the transferred colors".to_string()),
                ("content_weight".to_string(), "Share of the original colors".to_string()),
            ],
        }
    }
}
