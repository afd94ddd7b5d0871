//! Audit error types.

use thiserror::Error;

use crate::session::SessionId;

/// Errors raised by the audit subsystem.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An audit-relevant event arrived outside an active transaction.
    #[error("unable to create revision because of non-active transaction (session {session})")]
    TransactionNotInProgress {
        /// Session the event was raised in.
        session: SessionId,
    },

    /// The entity state does not line up with the persister's property list.
    #[error("state of {entity} has {found} values, persister declares {expected} properties")]
    StateLength {
        /// Entity name.
        entity: String,
        /// Number of declared properties.
        expected: usize,
        /// Number of values in the state snapshot.
        found: usize,
    },

    /// The audit sink rejected a write or undo.
    #[error("audit sink error: {0}")]
    Sink(String),

    /// An audit record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Audit configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration or script file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
