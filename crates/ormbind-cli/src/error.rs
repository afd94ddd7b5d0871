//! CLI errors.

use thiserror::Error;

/// Errors reported by the `ormbind` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Mapping document could not be loaded.
    #[error("{0}")]
    Core(#[from] ormbind_core::Error),

    /// Audit pipeline failure.
    #[error("audit error: {0}")]
    Audit(#[from] ormbind_audit::AuditError),

    /// Script could not be parsed.
    #[error("script error: {0}")]
    Script(#[from] serde_json::Error),

    /// Script could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Some entities failed to bind.
    #[error("{entities} entity(ies) failed to bind with {errors} error(s)")]
    Binding {
        /// Entities that failed.
        entities: usize,
        /// Mapping errors across those entities.
        errors: usize,
    },

    /// Script step refers to something the script never declared.
    #[error("step {step}: {message}")]
    InvalidStep {
        /// One-based step number.
        step: usize,
        /// What is wrong with the step.
        message: String,
    },
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
