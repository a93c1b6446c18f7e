//! Error taxonomy for the promotion pipeline.
//!
//! Every variant is fatal to the run that raised it: the sequencer never
//! retries a stage and never substitutes a fallback artifact. Variants map
//! one-to-one onto the failure modes of the external collaborators.

/// Errors produced by the pipeline core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The persisted project descriptor is missing or malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Bad arguments to identifier generation or context construction.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Artifact or image build failure.
    #[error("build error: {0}")]
    Build(String),

    /// Registry or source-control authentication failure.
    #[error("auth error: {0}")]
    Auth(String),

    /// Network failure while publishing.
    #[error("network error: {0}")]
    Network(String),

    /// Cluster apply failure.
    #[error("apply error: {0}")]
    Apply(String),

    /// Source-control commit rejected.
    #[error("conflict error: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Parse("missing version field".to_string());
        assert!(err.to_string().contains("parse error"));

        let err = PipelineError::InvalidInput("run counter must be positive".to_string());
        assert!(err.to_string().contains("invalid input"));

        let err = PipelineError::Conflict("non-fast-forward".to_string());
        assert!(err.to_string().contains("conflict error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
        assert!(err.to_string().contains("no such file"));
    }
}
