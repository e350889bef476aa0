//! # Gram Statistics Matching
//!
//! Iteratively pulls the frame's feature Gram matrix towards the style's while
//! a content term keeps it close to the input. Features are the color channels
//! plus horizontal and vertical differences, so both palette and texture
//! energy are matched.

mod optimizer;

pub use optimizer::GramOptimizer;

// Parameter names reported in the algorithm metadata
pub const ITERATIONS: &str = "iterations";
pub const STYLE_WEIGHT: &str = "style_weight";
pub const CONTENT_WEIGHT: &str = "content_weight";

pub const DEFAULT_LEARNING_RATE: f32 = 0.02;
pub const DEFAULT_MAX_WORKING_SIZE: u32 = 256;

// Adam moments
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;
