use std::collections::HashMap;

use crate::config::StyleSettings;
use crate::style::{ColorTransfer, GramOptimizer, HueShift, StyleAlgorithm};

/// Name of the algorithm used when none is configured
pub const DEFAULT_ALGORITHM: &str = "gram";

type Factory = Box<dyn Fn() -> Box<dyn StyleAlgorithm> + Send + Sync>;

/// Registry for the available style algorithms
///
/// Algorithms are registered by name and instantiated on request, with
/// the tuning values from [`StyleSettings`] baked in.
pub struct AlgorithmRegistry {
    algorithms: HashMap<String, Factory>,
}

impl AlgorithmRegistry {
    /// Create a registry with all built-in algorithms
    pub fn new(settings: &StyleSettings) -> Self {
        let mut registry = Self {
            algorithms: HashMap::new(),
        };
        registry.register_builtin(settings);
        registry
    }

    fn register_builtin(&mut self, settings: &StyleSettings) {
        let learning_rate = settings.learning_rate;
        let max_working_size = settings.max_working_size;
        self.register(DEFAULT_ALGORITHM, move || {
            Box::new(GramOptimizer::new(learning_rate, max_working_size))
        });

        self.register("color_transfer", || Box::new(ColorTransfer));

        let degrees = settings.hue_shift_degrees;
        self.register("hue_shift", move || Box::new(HueShift::new(degrees)));
    }

    /// Register a custom algorithm, replacing any with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn StyleAlgorithm> + Send + Sync + 'static,
    {
        self.algorithms.insert(name.into(), Box::new(factory));
    }

    /// Get a new instance of the named algorithm
    pub fn get(&self, name: &str) -> Option<Box<dyn StyleAlgorithm>> {
        self.algorithms.get(name).map(|factory| factory())
    }

    /// Registered names, sorted
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.algorithms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new(&StyleSettings::default())
    }
}
