use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    style::{gram, hue_shift, StyleParameters, DEFAULT_ALGORITHM},
};

/// Main configuration for video-styler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder/encoder settings
    pub video: VideoConfig,

    /// Style transfer settings
    pub style: StyleSettings,

    /// Pipeline execution settings
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.style.validate()?;
        self.processing.validate()?;
        Ok(())
    }
}

/// External decoder/encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// ffmpeg executable used for decoding and encoding
    pub ffmpeg_path: String,

    /// ffprobe executable used for reading container metadata
    pub ffprobe_path: String,

    /// Output video codec (any ffmpeg encoder name)
    pub codec: String,

    /// Quality setting (1-100, higher is better)
    pub quality: u8,

    /// Pixel format handed to the encoder
    pub pixel_format: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            // MPEG-4 Part 2 ("mp4v") ships with every ffmpeg build
            codec: "mpeg4".to_string(),
            quality: 85,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.ffmpeg_path".to_string(),
                value: self.ffmpeg_path.clone()
            }.into());
        }

        if self.ffprobe_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.ffprobe_path".to_string(),
                value: self.ffprobe_path.clone()
            }.into());
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.codec".to_string(),
                value: self.codec.clone()
            }.into());
        }

        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidValue {
                key: "video.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Style transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    /// Registered algorithm name (gram, color_transfer, hue_shift)
    pub algorithm: String,

    /// Number of optimization iterations per frame
    pub iterations: u32,

    /// Weight of the style loss
    pub style_weight: f64,

    /// Weight of the content loss
    pub content_weight: f64,

    /// Adam step size used by the gram optimizer
    pub learning_rate: f32,

    /// Longest edge, in pixels, the gram optimizer works at
    pub max_working_size: u32,

    /// Hue rotation applied by the hue_shift algorithm
    pub hue_shift_degrees: f32,
}

impl Default for StyleSettings {
    fn default() -> Self {
        let params = StyleParameters::default();
        Self {
            algorithm: DEFAULT_ALGORITHM.to_string(),
            iterations: params.iterations,
            style_weight: params.style_weight,
            content_weight: params.content_weight,
            learning_rate: gram::DEFAULT_LEARNING_RATE,
            max_working_size: gram::DEFAULT_MAX_WORKING_SIZE,
            hue_shift_degrees: hue_shift::DEFAULT_DEGREES,
        }
    }
}

impl StyleSettings {
    /// The numeric knobs handed to the style model
    pub fn parameters(&self) -> StyleParameters {
        StyleParameters {
            iterations: self.iterations,
            style_weight: self.style_weight,
            content_weight: self.content_weight,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "style.learning_rate".to_string(),
                value: self.learning_rate.to_string()
            }.into());
        }

        if self.max_working_size < 8 {
            return Err(ConfigError::InvalidValue {
                key: "style.max_working_size".to_string(),
                value: self.max_working_size.to_string()
            }.into());
        }

        if !self.hue_shift_degrees.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "style.hue_shift_degrees".to_string(),
                value: self.hue_shift_degrees.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Pipeline execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads for the global rayon pool
    pub processing_threads: usize,

    /// Frames transformed together; 1 keeps decode, transform and encode strictly sequential
    pub frame_batch: usize,

    /// Emit a progress event every N frames (0 disables)
    pub progress_interval: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            processing_threads: num_cpus::get(),
            frame_batch: 1,
            progress_interval: 30,
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.processing_threads".to_string(),
                value: self.processing_threads.to_string()
            }.into());
        }

        if self.frame_batch == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.frame_batch".to_string(),
                value: self.frame_batch.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_style_parameters() {
        let settings = StyleSettings::default();
        assert_eq!(settings.iterations, 500);
        assert_eq!(settings.style_weight, 1e6);
        assert_eq!(settings.content_weight, 1.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.style.algorithm = "color_transfer".to_string();
        original_config.video.codec = "libx264".to_string();

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.style.algorithm, "color_transfer");
        assert_eq!(loaded_config.video.codec, "libx264");
        assert_eq!(loaded_config.processing.frame_batch, original_config.processing.frame_batch);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[style]\niterations = 25\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.style.iterations, 25);
        assert_eq!(config.style.algorithm, "gram");
        assert_eq!(config.video.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::StylerError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_quality() {
        let mut config = Config::default();
        config.video.quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_batch() {
        let mut config = Config::default();
        config.processing.frame_batch = 0;
        assert!(config.validate().is_err());
    }
}
