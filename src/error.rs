//! Error types for the pulse detector.

/// Top-level error type for detector setup and configuration.
///
/// Nothing raised from a sampling tick ends up here: ticks degrade instead of
/// failing. These variants cover configuration and host plumbing.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Result type alias using PulseError.
pub type PulseResult<T> = Result<T, PulseError>;

impl PulseError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

/// Raised by a host element when its current frame cannot be drawn or read
/// back, e.g. a cross-origin video tainting the raster. The sampler turns it
/// into a fallback color; it never leaves a tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameAccessError {
    #[error("frame access restricted: {0}")]
    Restricted(String),

    #[error("frame draw failed: {0}")]
    Draw(String),
}
