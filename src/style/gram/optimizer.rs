use image::{
    imageops::{self, FilterType},
    Rgb32FImage,
};
use rayon::prelude::*;
use tracing::trace;

use crate::{
    error::TransformError,
    style::numeric::{feature_gram, pixel_features, Gram, FEATURES},
    style::traits::AlgorithmMetadata,
    style::{StyleAlgorithm, StyleParameters, StyleReference},
};

use super::{
    BETA1, BETA2, CONTENT_WEIGHT, DEFAULT_LEARNING_RATE, DEFAULT_MAX_WORKING_SIZE, EPSILON,
    ITERATIONS, STYLE_WEIGHT,
};

/// Gram matching optimized with Adam
///
/// The optimization runs on a downscaled copy of the frame whose long edge is
/// at most `max_working_size`. Only the change it makes is upsampled, so the
/// full-resolution detail of the input survives.
#[derive(Debug, Clone)]
pub struct GramOptimizer {
    learning_rate: f32,
    max_working_size: u32,
}

impl GramOptimizer {
    pub fn new(learning_rate: f32, max_working_size: u32) -> Self {
        Self {
            learning_rate,
            max_working_size: max_working_size.max(1),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn max_working_size(&self) -> u32 {
        self.max_working_size
    }

    /// Resolution the optimization runs at for a frame of the given size
    pub fn working_size(&self, width: u32, height: u32) -> (u32, u32) {
        let long_edge = width.max(height);
        if long_edge <= self.max_working_size {
            return (width, height);
        }

        let scale = self.max_working_size as f64 / long_edge as f64;
        (
            ((width as f64 * scale).round() as u32).max(1),
            ((height as f64 * scale).round() as u32).max(1),
        )
    }

    /// Run Adam from `content` for `params.iterations` steps
    fn optimize(
        &self,
        content: &[f32],
        width: usize,
        height: usize,
        target: &Gram,
        params: &StyleParameters,
    ) -> Vec<f32> {
        let mut x = content.to_vec();
        let mut grad = vec![0.0f32; x.len()];
        let mut m = vec![0.0f64; x.len()];
        let mut v = vec![0.0f64; x.len()];
        // D·f per pixel, where D is the Gram residual scaled by the style weight
        let mut mixed = vec![[0.0f32; FEATURES]; width * height];

        let content_weight = params.content_weight as f32;
        let learning_rate = self.learning_rate as f64;
        let (mut beta1_t, mut beta2_t) = (1.0f64, 1.0f64);

        for step in 1..=params.iterations {
            let gram = feature_gram(&x, width, height);
            let mut residual = [[0.0f64; FEATURES]; FEATURES];
            let mut distance = 0.0f64;
            for i in 0..FEATURES {
                for j in 0..FEATURES {
                    let r = gram[i][j] - target[i][j];
                    distance += r * r;
                    residual[i][j] = 2.0 * params.style_weight * r;
                }
            }
            if step == 1 || step % 100 == 0 {
                trace!("gram step {}: style distance {:.6e}", step, distance);
            }

            mixed.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
                for (px, h) in row.iter_mut().enumerate() {
                    let f = pixel_features(&x, width, height, px, y);
                    for i in 0..FEATURES {
                        let mut acc = 0.0f64;
                        for j in 0..FEATURES {
                            acc += residual[i][j] * f[j] as f64;
                        }
                        h[i] = acc as f32;
                    }
                }
            });

            // Each difference feature touches two pixels, so its share of the
            // gradient is gathered from the left and upper neighbours too
            grad.par_chunks_mut(width * 3).enumerate().for_each(|(y, row)| {
                for px in 0..width {
                    let p = y * width + px;
                    let h = &mixed[p];
                    for c in 0..3 {
                        let i = p * 3 + c;
                        let mut g = content_weight * (x[i] - content[i]) + h[c];
                        if px + 1 < width {
                            g -= h[3 + c];
                        }
                        if px > 0 {
                            g += mixed[p - 1][3 + c];
                        }
                        if y + 1 < height {
                            g -= h[6 + c];
                        }
                        if y > 0 {
                            g += mixed[p - width][6 + c];
                        }
                        row[px * 3 + c] = g;
                    }
                }
            });

            beta1_t *= BETA1;
            beta2_t *= BETA2;
            let (bias1, bias2) = (1.0 - beta1_t, 1.0 - beta2_t);

            x.par_iter_mut()
                .zip(m.par_iter_mut())
                .zip(v.par_iter_mut())
                .zip(grad.par_iter())
                .for_each(|(((xv, mv), vv), &g)| {
                    let g = g as f64;
                    *mv = BETA1 * *mv + (1.0 - BETA1) * g;
                    *vv = BETA2 * *vv + (1.0 - BETA2) * g * g;
                    let update = learning_rate * (*mv / bias1) / ((*vv / bias2).sqrt() + EPSILON);
                    *xv = (*xv as f64 - update).clamp(0.0, 1.0) as f32;
                });
        }

        x
    }

    fn failure(&self, reason: String) -> TransformError {
        TransformError::AlgorithmFailed {
            algorithm: self.name().to_string(),
            reason,
        }
    }
}

impl Default for GramOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, DEFAULT_MAX_WORKING_SIZE)
    }
}

impl StyleAlgorithm for GramOptimizer {
    fn name(&self) -> &str {
        "gram"
    }

    fn description(&self) -> &str {
        "Matches color and texture statistics of the style by iterative optimization"
    }

    fn stylize(
        &self,
        content: &Rgb32FImage,
        style: &StyleReference,
        params: &StyleParameters,
    ) -> Result<Rgb32FImage, TransformError> {
        let (width, height) = content.dimensions();
        if params.iterations == 0 || width == 0 || height == 0 {
            return Ok(content.clone());
        }

        if !(params.style_weight.is_finite() && params.content_weight.is_finite()) {
            return Err(self.failure(format!(
                "loss weights must be finite (style {}, content {})",
                params.style_weight, params.content_weight
            )));
        }

        let (work_w, work_h) = self.working_size(width, height);
        let scaled = (work_w, work_h) != (width, height);
        let small = if scaled {
            imageops::resize(content, work_w, work_h, FilterType::Triangle)
        } else {
            content.clone()
        };

        let optimized = self.optimize(
            small.as_raw(),
            work_w as usize,
            work_h as usize,
            &style.statistics().gram,
            params,
        );
        let optimized = Rgb32FImage::from_raw(work_w, work_h, optimized)
            .ok_or_else(|| self.failure("optimized buffer has the wrong length".to_string()))?;

        if !scaled {
            return Ok(optimized);
        }

        // Upsample both so the resampling error cancels out
        let changed = imageops::resize(&optimized, width, height, FilterType::Triangle);
        let baseline = imageops::resize(&small, width, height, FilterType::Triangle);

        let mut output = content.clone();
        for ((out, after), before) in output.iter_mut().zip(changed.iter()).zip(baseline.iter()) {
            *out = (*out + after - before).clamp(0.0, 1.0);
        }
        Ok(output)
    }

    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            iterative: true,
            performance_impact: 1.0,
            parameters: vec![
                (ITERATIONS.to_string(), "Adam steps per frame".to_string()),
                (STYLE_WEIGHT.to_string(), "Weight of the Gram distance".to_string()),
                (CONTENT_WEIGHT.to_string(), "Weight of the distance to the input".to_string()),
            ],
        }
    }
}
