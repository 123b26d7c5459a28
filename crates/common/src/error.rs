//! Error types shared across Deixis crates.

use std::path::PathBuf;

/// Top-level error type for Deixis operations.
#[derive(Debug, thiserror::Error)]
pub enum DeixisError {
    /// A required setting is absent or invalid. Raised before any inference runs.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The checkpoint could not be read or parsed at all.
    #[error("Model load error ({path}): {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// A clip did not match the shape the engine was configured for.
    #[error("Inference error at start index {start_index}: {message}")]
    Inference { start_index: usize, message: String },

    /// A log file or frame source does not exist or cannot be opened.
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Frame decode error ({path}): {message}")]
    FrameDecode { path: PathBuf, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using DeixisError.
pub type DeixisResult<T> = Result<T, DeixisError>;

impl DeixisError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn model_load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn inference(start_index: usize, msg: impl Into<String>) -> Self {
        Self::Inference {
            start_index,
            message: msg.into(),
        }
    }

    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    pub fn frame_decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::FrameDecode {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    /// Whether this is a configuration error (reported before any work starts).
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = DeixisError::config("missing required setting `movie`");
        assert!(err.to_string().contains("`movie`"));

        let err = DeixisError::source_not_found("/tmp/deepoint_log.txt");
        assert_eq!(err.to_string(), "Source not found: /tmp/deepoint_log.txt");

        let err = DeixisError::inference(12, "expected 15 frames, got 3");
        assert!(err.to_string().contains("start index 12"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: DeixisError = io.into();
        assert!(matches!(err, DeixisError::Io(_)));
        assert!(!err.is_config());
    }
}
