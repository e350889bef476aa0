use thiserror::Error;

/// Main error type for the video-styler library
#[derive(Error, Debug)]
pub enum StylerError {
    #[error("Failed to open video: {0}")]
    Open(#[from] OpenError),

    #[error("Failed to load style: {0}")]
    Load(#[from] LoadError),

    #[error("Style transfer failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Style transfer failed on frame {index}: {source}")]
    FrameFailed {
        index: u64,
        #[source]
        source: TransformError,
    },

    #[error("Failed to decode video: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to write video: {0}")]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown style algorithm: {name}")]
    UnknownAlgorithm { name: String },

    #[error("Processing cancelled after {frames_processed} frames")]
    Cancelled { frames_processed: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while opening a video container for reading or writing
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("video file not found: {path}")]
    NotFound { path: String },

    #[error("unsupported video format: {path} ({reason})")]
    UnsupportedFormat { path: String, reason: String },

    #[error("invalid output geometry: {width}x{height} @ {fps} fps")]
    InvalidGeometry { width: u32, height: u32, fps: f64 },

    #[error("could not start encoder for {path}: {reason}")]
    EncoderFailed { path: String, reason: String },

    #[error("could not launch {program}; is it installed and on PATH?")]
    ToolUnavailable { program: String },

    #[error("output {path} is the input video")]
    OutputIsInput { path: String },
}

/// Errors raised while loading a style reference image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("style image not found: {path}")]
    NotFound { path: String },

    #[error("could not decode style image {path}: {reason}")]
    DecodeFailed { path: String, reason: String },
}

/// Errors raised by the per-frame transform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("no style image loaded")]
    NoStyleLoaded,

    #[error("{algorithm} failed: {reason}")]
    AlgorithmFailed { algorithm: String, reason: String },
}

/// Errors raised while pulling frames out of a decoder
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("video source is not open")]
    NotOpen,

    #[error("truncated frame in {path}: expected {expected} bytes, got {received}")]
    Truncated {
        path: String,
        expected: usize,
        received: usize,
    },

    #[error("decoder failed on {path}: {reason}")]
    DecoderFailed { path: String, reason: String },
}

/// Errors raised while pushing frames into an encoder
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("frame {frame}: size {}x{} does not match output size {}x{}", actual.0, actual.1, expected.0, expected.1)]
    SizeMismatch {
        frame: u64,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("video sink is closed")]
    Closed,

    #[error("encoder failure on {path}: {reason}")]
    EncoderFailure { path: String, reason: String },
}

/// Errors raised while installing the log subscriber
#[derive(Error, Debug)]
pub enum LogError {
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not install log subscriber: {reason}")]
    Install { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StylerError
pub type Result<T> = std::result::Result<T, StylerError>;

impl StylerError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Open(OpenError::NotFound { path }) => {
                format!("Input video '{}' does not exist.", path)
            }
            Self::Open(OpenError::ToolUnavailable { program }) => {
                format!("'{}' is required but could not be started. Please install FFmpeg.", program)
            }
            Self::Load(LoadError::NotFound { path }) => {
                format!("Style image '{}' does not exist.", path)
            }
            Self::Load(LoadError::DecodeFailed { path, .. }) => {
                format!("Could not read style image '{}'. Please use a PNG or JPEG file.", path)
            }
            Self::UnknownAlgorithm { name } => {
                format!("Style algorithm '{}' not found. Available algorithms: gram, color_transfer, hue_shift", name)
            }
            Self::Open(OpenError::OutputIsInput { path }) => {
                format!("Refusing to overwrite the input video '{}'. Choose a different output path.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
