//! Core error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of source a mapping definition was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Annotations found on a class by the scanner.
    Annotation,
    /// A mapping document (the XML override analog).
    Document,
    /// Anything else (programmatic construction, tests).
    Other,
}

impl std::fmt::Display for OriginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginKind::Annotation => write!(f, "class"),
            OriginKind::Document => write!(f, "document"),
            OriginKind::Other => write!(f, "source"),
        }
    }
}

/// The file or class currently being bound, used when reporting errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// Source kind.
    pub kind: OriginKind,
    /// Class or document name.
    pub name: String,
}

impl Origin {
    /// Origin for a class read from annotations.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            kind: OriginKind::Annotation,
            name: name.into(),
        }
    }

    /// Origin for a mapping document.
    pub fn document(name: impl Into<String>) -> Self {
        Self {
            kind: OriginKind::Document,
            name: name.into(),
        }
    }

    /// Origin that is neither a class nor a document.
    pub fn other(name: impl Into<String>) -> Self {
        Self {
            kind: OriginKind::Other,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// A mapping-definition error: conflicting or missing annotation configuration.
///
/// Fatal to the binding pass of the entity it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} [{origin}]")]
pub struct MappingError {
    /// Human-readable description.
    pub message: String,
    /// Where the offending definition came from.
    pub origin: Origin,
}

impl MappingError {
    /// Create a new mapping error.
    pub fn new(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            message: message.into(),
            origin,
        }
    }
}

/// Every mapping error collected while binding one entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}: {} mapping error(s), first: {}", .errors.len(), first_message(.errors))]
pub struct BindingErrors {
    /// Entity being bound.
    pub entity: String,
    /// Errors in attribute order.
    pub errors: Vec<MappingError>,
}

fn first_message(errors: &[MappingError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("none")
}

impl BindingErrors {
    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors raised while reading typed values out of an annotation instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    /// A single instance was expected but several were found.
    #[error("@{name} is present {count} times, expected at most one")]
    Duplicate {
        /// Qualified annotation name.
        name: String,
        /// Number of instances found.
        count: usize,
    },

    /// The value under a key has a different kind than requested.
    #[error("@{annotation}.{key}: expected {expected} value, found {found}")]
    TypeMismatch {
        /// Qualified annotation name.
        annotation: String,
        /// Value key.
        key: String,
        /// Requested kind.
        expected: &'static str,
        /// Actual kind.
        found: &'static str,
    },

    /// An enum value names a constant that does not exist.
    #[error("@{annotation}.{key}: unknown constant {constant}")]
    UnknownConstant {
        /// Qualified annotation name.
        annotation: String,
        /// Value key.
        key: String,
        /// Offending constant.
        constant: String,
    },

    /// A required value is absent.
    #[error("@{annotation}.{key} is required")]
    MissingValue {
        /// Qualified annotation name.
        annotation: String,
        /// Value key.
        key: String,
    },
}

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Single mapping-definition error.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// All mapping errors of one entity.
    #[error("binding failed: {0}")]
    Binding(#[from] BindingErrors),

    /// Annotation value lookup error.
    #[error("annotation error: {0}")]
    Annotation(#[from] AnnotationError),

    /// Mapping document could not be parsed.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),

    /// Mapping document could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
