use thiserror::Error;

/// Configuration and construction faults.
///
/// Numeric problems in the audio data itself (NaN samples, silent spectra)
/// are never reported through this type; they degrade the visuals instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SketchError {
    #[error("smoothing window size must be at least 1")]
    ZeroWindow,

    #[error("bucket count must be at least 1")]
    ZeroBuckets,

    #[error("buffer size must be a power of two >= 2, got {0}")]
    InvalidBufferSize(usize),

    #[error("canvas dimensions must be non-zero, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("invalid range for {name}: [{min}, {max}]")]
    InvalidRange { name: &'static str, min: f32, max: f32 },

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("malformed utterance '{0}', expected TIME:TEXT")]
    MalformedUtterance(String),
}
