use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use image::{Rgb32FImage, RgbImage};
use tracing::{debug, info, warn};

use crate::config::StyleSettings;
use crate::error::{LoadError, StylerError, TransformError};
use crate::style::numeric::{postprocess, preprocess, StyleStatistics};
use crate::style::registry::AlgorithmRegistry;
use crate::style::traits::StyleAlgorithm;
use crate::video::types::Frame;

/// Numeric knobs of the style transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParameters {
    /// Optimization steps per frame
    pub iterations: u32,

    /// Weight of matching the style statistics
    pub style_weight: f64,

    /// Weight of staying close to the input frame
    pub content_weight: f64,
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self {
            iterations: 500,
            style_weight: 1e6,
            content_weight: 1.0,
        }
    }
}

/// A decoded style image together with its precomputed statistics
#[derive(Debug)]
pub struct StyleReference {
    image: Rgb32FImage,
    statistics: StyleStatistics,
    source: PathBuf,
}

impl StyleReference {
    /// Build a reference from an 8-bit image; `source` is only used for reporting
    pub fn from_rgb(image: &RgbImage, source: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let source = source.into();
        if image.width() == 0 || image.height() == 0 {
            return Err(LoadError::DecodeFailed {
                path: source.display().to_string(),
                reason: "image is empty".to_string(),
            });
        }

        let image = preprocess(&Frame::new(image.clone()));
        let statistics = StyleStatistics::from_image(&image);
        Ok(Self { image, statistics, source })
    }

    /// Normalized style image
    pub fn image(&self) -> &Rgb32FImage {
        &self.image
    }

    pub fn statistics(&self) -> &StyleStatistics {
        &self.statistics
    }

    /// Where the style was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Holds one style reference and applies it to frames
///
/// The reference sits behind a lock and is swapped as a whole, so a
/// [`transform`](Self::transform) running on another thread sees either the
/// old style or the new one, never a mix. All methods take `&self`; share the
/// model with `Arc` to transform frames concurrently.
pub struct StyleModel {
    algorithm: Box<dyn StyleAlgorithm>,
    reference: RwLock<Option<Arc<StyleReference>>>,
    parameters: RwLock<StyleParameters>,
}

impl StyleModel {
    /// Create an unloaded model with default parameters
    pub fn new(algorithm: Box<dyn StyleAlgorithm>) -> Self {
        Self {
            algorithm,
            reference: RwLock::new(None),
            parameters: RwLock::new(StyleParameters::default()),
        }
    }

    /// Create a model using the algorithm and parameters named in the settings
    pub fn from_settings(settings: &StyleSettings) -> Result<Self, StylerError> {
        let registry = AlgorithmRegistry::new(settings);
        let algorithm = registry
            .get(&settings.algorithm)
            .ok_or_else(|| StylerError::UnknownAlgorithm { name: settings.algorithm.clone() })?;

        let model = Self::new(algorithm);
        let params = settings.parameters();
        model.set_parameters(params.iterations, params.style_weight, params.content_weight);
        Ok(model)
    }

    /// Load a style image from disk
    ///
    /// On success the new style replaces the old one. On failure the model
    /// is left unloaded, even if a style had been loaded before.
    pub fn load_style<P: AsRef<Path>>(&self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let result = read_reference(path);
        self.install(result)
    }

    /// Load a style from an in-memory image, with the same replacement rules as
    /// [`load_style`](Self::load_style)
    pub fn load_style_image(&self, image: &RgbImage, label: &str) -> Result<(), LoadError> {
        self.install(StyleReference::from_rgb(image, label))
    }

    fn install(&self, result: Result<StyleReference, LoadError>) -> Result<(), LoadError> {
        let mut slot = self.reference.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(reference) => {
                let (width, height) = reference.dimensions();
                info!("Loaded style {} ({}x{})", reference.source().display(), width, height);
                *slot = Some(Arc::new(reference));
                Ok(())
            }
            Err(e) => {
                if slot.take().is_some() {
                    warn!("Discarding previously loaded style after failed load");
                }
                Err(e)
            }
        }
    }

    /// Whether the most recent load succeeded
    pub fn is_loaded(&self) -> bool {
        self.reference
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The style currently in effect
    pub fn style_reference(&self) -> Option<Arc<StyleReference>> {
        self.reference
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the numeric knobs; takes effect on the next transform
    ///
    /// Any values are accepted.
    pub fn set_parameters(&self, iterations: u32, style_weight: f64, content_weight: f64) {
        let mut params = self.parameters.write().unwrap_or_else(PoisonError::into_inner);
        *params = StyleParameters {
            iterations,
            style_weight,
            content_weight,
        };
        debug!(
            "Style parameters: {} iterations, style weight {}, content weight {}",
            iterations, style_weight, content_weight
        );
    }

    pub fn parameters(&self) -> StyleParameters {
        *self.parameters.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    /// Stylize one frame: preprocess, run the algorithm, postprocess
    pub fn transform(&self, frame: Frame) -> Result<Frame, TransformError> {
        let reference = self.style_reference().ok_or(TransformError::NoStyleLoaded)?;
        let params = self.parameters();

        let content = preprocess(&frame);
        drop(frame);

        let stylized = self.algorithm.stylize(&content, &reference, &params)?;
        if stylized.dimensions() != content.dimensions() {
            return Err(TransformError::AlgorithmFailed {
                algorithm: self.algorithm.name().to_string(),
                reason: format!(
                    "returned {}x{} for a {}x{} frame",
                    stylized.width(),
                    stylized.height(),
                    content.width(),
                    content.height()
                ),
            });
        }

        Ok(postprocess(&stylized))
    }
}

fn read_reference(path: &Path) -> Result<StyleReference, LoadError> {
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(LoadError::NotFound { path: path_str });
    }

    let image = image::open(path).map_err(|e| LoadError::DecodeFailed {
        path: path_str,
        reason: e.to_string(),
    })?;

    StyleReference::from_rgb(&image.to_rgb8(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorTransfer, GramOptimizer, HueShift};
    use crate::video::synthetic;
    use image::Rgb;
    use tempfile::tempdir;

    fn loaded_model(algorithm: Box<dyn StyleAlgorithm>) -> StyleModel {
        let model = StyleModel::new(algorithm);
        model
            .load_style_image(&synthetic::test_style_image(64, 64, 1), "test-style")
            .unwrap();
        model
    }

    /// Returns an image of the wrong size, to exercise the geometry check
    struct Shrinker;

    impl StyleAlgorithm for Shrinker {
        fn name(&self) -> &str {
            "shrinker"
        }

        fn description(&self) -> &str {
            "always returns a 1x1 image"
        }

        fn stylize(&self, _: &Rgb32FImage, _: &StyleReference, _: &StyleParameters) -> Result<Rgb32FImage, TransformError> {
            Ok(Rgb32FImage::from_pixel(1, 1, Rgb([0.5, 0.5, 0.5])))
        }
    }

    #[test]
    fn test_default_model_is_unloaded() {
        let model = StyleModel::new(Box::new(GramOptimizer::default()));
        assert!(!model.is_loaded());
        assert_eq!(model.parameters(), StyleParameters::default());
        assert_eq!(model.algorithm_name(), "gram");
    }

    #[test]
    fn test_transform_without_style() {
        let model = StyleModel::new(Box::new(GramOptimizer::default()));
        for (w, h) in [(640, 480), (1, 1), (3, 7)] {
            let result = model.transform(Frame::new_filled(w, h, [128, 128, 128]));
            assert_eq!(result, Err(TransformError::NoStyleLoaded));
        }
    }

    #[test]
    fn test_load_nonexistent_style() {
        let model = StyleModel::new(Box::new(GramOptimizer::default()));
        let result = model.load_style("non_existent_style.jpg");

        assert!(matches!(result, Err(LoadError::NotFound { .. })));
        assert!(!model.is_loaded());
        assert_eq!(
            model.transform(Frame::new_black(4, 4)),
            Err(TransformError::NoStyleLoaded)
        );
    }

    #[test]
    fn test_load_valid_style_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_style.png");
        synthetic::write_style_image(&path, 256, 256, 3).unwrap();

        let model = StyleModel::new(Box::new(GramOptimizer::default()));
        model.load_style(&path).unwrap();

        assert!(model.is_loaded());
        let reference = model.style_reference().unwrap();
        assert_eq!(reference.dimensions(), (256, 256));
        assert_eq!(reference.source(), path.as_path());
    }

    #[test]
    fn test_undecodable_style() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let model = StyleModel::new(Box::new(GramOptimizer::default()));
        assert!(matches!(model.load_style(&path), Err(LoadError::DecodeFailed { .. })));
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_failed_reload_resets_to_unloaded() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        assert!(model.is_loaded());

        assert!(model.load_style("missing.png").is_err());
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_reload_replaces_style() {
        let model = loaded_model(Box::new(ColorTransfer));
        let first = model.style_reference().unwrap();

        model
            .load_style_image(&synthetic::test_style_image(32, 16, 9), "second")
            .unwrap();
        let second = model.style_reference().unwrap();

        assert_eq!(second.dimensions(), (32, 16));
        // the old reference is untouched for anyone still holding it
        assert_eq!(first.dimensions(), (64, 64));
    }

    #[test]
    fn test_empty_style_image_is_rejected() {
        let model = StyleModel::new(Box::new(ColorTransfer));
        let result = model.load_style_image(&RgbImage::new(0, 0), "empty");
        assert!(matches!(result, Err(LoadError::DecodeFailed { .. })));
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_transform_preserves_geometry() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        model.set_parameters(3, 1e6, 1.0);

        for (w, h) in [(640, 480), (33, 17), (1, 1)] {
            let output = model.transform(synthetic::test_frame(w, h, 0)).unwrap();
            assert_eq!(output.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        model.set_parameters(0, 1e6, 1.0);

        let frame = synthetic::test_frame(48, 32, 2);
        let output = model.transform(frame.clone()).unwrap();
        assert_eq!(output, frame);
    }

    #[test]
    fn test_transform_is_reproducible() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        model.set_parameters(4, 1e6, 1.0);

        let frame = synthetic::test_frame(64, 40, 1);
        let first = model.transform(frame.clone()).unwrap();
        let second = model.transform(frame.clone()).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, frame);
    }

    #[test]
    fn test_transform_does_not_touch_style() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        model.set_parameters(2, 1e6, 1.0);
        let before = model.style_reference().unwrap().image().clone();

        model.transform(synthetic::test_frame(32, 32, 0)).unwrap();

        assert_eq!(model.style_reference().unwrap().image(), &before);
    }

    #[test]
    fn test_parameters_apply_to_next_transform() {
        let model = loaded_model(Box::new(GramOptimizer::default()));
        let frame = synthetic::test_frame(32, 24, 0);

        model.set_parameters(0, 1e6, 1.0);
        assert_eq!(model.transform(frame.clone()).unwrap(), frame);

        model.set_parameters(3, 1e6, 1.0);
        assert_ne!(model.transform(frame.clone()).unwrap(), frame);
    }

    #[test]
    fn test_hue_shift_model_changes_colors() {
        let model = loaded_model(Box::new(HueShift::default()));
        let frame = Frame::new_filled(8, 8, [200, 100, 50]);

        let output = model.transform(frame.clone()).unwrap();
        assert_ne!(output, frame);
    }

    #[test]
    fn test_wrong_output_size_is_reported() {
        let model = loaded_model(Box::new(Shrinker));
        let result = model.transform(Frame::new_black(4, 4));
        assert!(matches!(result, Err(TransformError::AlgorithmFailed { .. })));
    }

    #[test]
    fn test_from_settings_unknown_algorithm() {
        let settings = StyleSettings {
            algorithm: "impressionism".to_string(),
            ..StyleSettings::default()
        };
        assert!(matches!(
            StyleModel::from_settings(&settings),
            Err(StylerError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_from_settings_applies_parameters() {
        let settings = StyleSettings {
            algorithm: "color_transfer".to_string(),
            iterations: 12,
            style_weight: 2e6,
            content_weight: 2.0,
            ..StyleSettings::default()
        };
        let model = StyleModel::from_settings(&settings).unwrap();

        assert_eq!(model.algorithm_name(), "color_transfer");
        assert_eq!(
            model.parameters(),
            StyleParameters { iterations: 12, style_weight: 2e6, content_weight: 2.0 }
        );
    }
}
