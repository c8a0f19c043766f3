//! Error types for strata_render

use thiserror::Error;

/// Errors reported by a [`Backend`](crate::backend::Backend)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend could not allocate an offscreen target
    #[error("Target allocation failed: {0}")]
    TargetAllocation(String),

    /// A target id the backend does not know about
    #[error("Unknown render target {0}")]
    UnknownTarget(u64),

    /// Submission failed
    #[error("Submission failed: {0}")]
    Submit(String),
}

/// Errors that can occur while recording or rendering a frame
#[derive(Error, Debug)]
pub enum RenderError {
    /// `pop_layer` without a matching `push_layer`
    #[error("Layer stack underflow: no layer to pop")]
    LayerStackUnderflow,

    /// Drawing or `end_frame` outside of `begin_frame`/`end_frame`
    #[error("No frame in progress")]
    FrameNotStarted,

    /// `begin_frame` while a frame is already being recorded
    #[error("A frame is already in progress")]
    FrameAlreadyStarted,

    /// Layers nested deeper than the configured maximum
    #[error("Layer depth exceeded the maximum of {max}")]
    LayerDepthExceeded { max: usize },

    /// Backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Invalid canvas configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<strata_tess::ConfigError> for RenderError {
    fn from(err: strata_tess::ConfigError) -> Self {
        RenderError::Config(err.to_string())
    }
}

/// Result type for strata_render operations
pub type Result<T> = std::result::Result<T, RenderError>;
