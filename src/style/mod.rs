//! # Style System
//!
//! The [`StyleModel`] owns one style reference and turns content frames into
//! stylized frames. The numeric work is delegated to a [`StyleAlgorithm`],
//! chosen by name from the [`AlgorithmRegistry`].
//!
//! ## Built-in Algorithms
//!
//! - **gram**: Adam optimization of color and texture Gram statistics (default)
//! - **color_transfer**: Per-channel mean and contrast matching
//! - **hue_shift**: Fixed hue rotation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use video_styler::style::{GramOptimizer, StyleModel};
//! use video_styler::video::Frame;
//!
//! let model = StyleModel::new(Box::new(GramOptimizer::default()));
//! model.load_style("style.jpg")?;
//! model.set_parameters(100, 1e6, 1.0);
//!
//! let stylized = model.transform(Frame::new_black(640, 480))?;
//! # Ok::<(), video_styler::StylerError>(())
//! ```

pub mod model;
pub mod numeric;
pub mod registry;
pub mod traits;

// Algorithm implementations
pub mod color_transfer;
pub mod gram;
pub mod hue_shift;

pub use model::{StyleModel, StyleParameters, StyleReference};
pub use numeric::{postprocess, preprocess, StyleStatistics};
pub use registry::{AlgorithmRegistry, DEFAULT_ALGORITHM};
pub use traits::{AlgorithmMetadata, StyleAlgorithm};

pub use color_transfer::ColorTransfer;
pub use gram::GramOptimizer;
pub use hue_shift::HueShift;
