use image::Rgb32FImage;

use crate::error::TransformError;
use crate::style::model::{StyleParameters, StyleReference};

/// Core trait that all style transfer algorithms implement
///
/// An algorithm is the numeric middle of the transform: it receives the
/// content frame already normalized to [0, 1] and returns a normalized image
/// of the same size. Converting to and from 8-bit frames is done by
/// [`StyleModel`](crate::style::StyleModel) around it.
///
/// Implementations must be deterministic for identical inputs and
/// parameters, and must not keep mutable state between calls: several
/// frames may be stylized concurrently against the same model.
pub trait StyleAlgorithm: Send + Sync {
    /// Returns the unique name of this algorithm
    fn name(&self) -> &str;

    /// Returns a human-readable description of this algorithm
    fn description(&self) -> &str;

    /// Stylize one normalized frame
    ///
    /// # Arguments
    ///
    /// * `content` - The frame to stylize, channel values in [0, 1]
    /// * `style` - The loaded style reference; read-only
    /// * `params` - Iteration count and loss weights in effect for this call
    fn stylize(
        &self,
        content: &Rgb32FImage,
        style: &StyleReference,
        params: &StyleParameters,
    ) -> Result<Rgb32FImage, TransformError>;

    /// Describe what this algorithm does with the parameters
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata::default()
    }
}

/// Metadata about an algorithm's behavior and cost
#[derive(Debug, Clone, Default)]
pub struct AlgorithmMetadata {
    /// Whether `iterations` controls the amount of work done
    pub iterative: bool,

    /// Estimated performance impact (0.0 = minimal, 1.0 = heavy)
    pub performance_impact: f32,

    /// Parameters the algorithm honors, with descriptions
    pub parameters: Vec<(String, String)>,
}
