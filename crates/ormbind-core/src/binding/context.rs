//! Binding context and the injected message logger.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{AnnotationError, MappingError, Origin};

/// Produces (and records) the messages for mapping-definition failures.
///
/// Implementors only decide where a message goes; the wording lives in the provided
/// methods so every logger reports the same text.
pub trait MappingMessageLogger: Send + Sync {
    /// Emit a warning-level message.
    fn warn(&self, message: &str);

    /// Both a collection table and a join table were declared on one attribute.
    fn collection_table_and_join_table_used_together(&self, entity: &str, attribute: &str) -> String {
        let message = format!(
            "@CollectionTable and @JoinTable specified on the same attribute. Check {}#{}",
            entity, attribute
        );
        self.warn(&message);
        message
    }

    /// A collection table was declared without an element collection.
    fn collection_table_without_element_collection(&self, entity: &str, attribute: &str) -> String {
        let message = format!(
            "@CollectionTable annotation without a @ElementCollection. Check {}#{}",
            entity, attribute
        );
        self.warn(&message);
        message
    }

    /// A join table was declared on an attribute that is not an association.
    fn join_table_for_non_association_attribute(&self, entity: &str, attribute: &str) -> String {
        let message = format!(
            "@JoinTable annotation without an association. Check {}#{}",
            entity, attribute
        );
        self.warn(&message);
        message
    }
}

/// Logger that emits through `tracing`.
#[derive(Debug, Default)]
pub struct TracingMessageLogger;

impl MappingMessageLogger for TracingMessageLogger {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "ormbind::binding", "{}", message);
    }
}

/// Logger that keeps every message in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingMessageLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingMessageLogger {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MappingMessageLogger for RecordingMessageLogger {
    fn warn(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// State shared by every attribute bound for one entity.
///
/// A context is not meant to be mutated concurrently; independent contexts can be
/// bound on separate threads.
#[derive(Clone)]
pub struct BindingContext {
    origin: Origin,
    logger: Arc<dyn MappingMessageLogger>,
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl BindingContext {
    /// Create a context that logs through `tracing`.
    pub fn new(origin: Origin) -> Self {
        Self::with_logger(origin, Arc::new(TracingMessageLogger))
    }

    /// Create a context with an explicit message logger.
    pub fn with_logger(origin: Origin, logger: Arc<dyn MappingMessageLogger>) -> Self {
        Self { origin, logger }
    }

    /// The class or document being bound.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The injected message logger.
    pub fn logger(&self) -> &dyn MappingMessageLogger {
        self.logger.as_ref()
    }

    /// Build a mapping error located at this context's origin.
    pub fn make_mapping_error(&self, message: impl Into<String>) -> MappingError {
        MappingError::new(message, self.origin.clone())
    }

    /// Turn an annotation lookup error into a mapping error for `role`.
    pub fn annotation_error(&self, role: &str, err: AnnotationError) -> MappingError {
        self.make_mapping_error(format!("{} (property: {})", err, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_logger_captures_messages() {
        let logger = Arc::new(RecordingMessageLogger::new());
        let context = BindingContext::with_logger(Origin::class("com.acme.Order"), logger.clone());

        let message = context
            .logger()
            .join_table_for_non_association_attribute("com.acme.Order", "total");

        assert_eq!(logger.len(), 1);
        assert_eq!(logger.messages()[0], message);
        assert!(message.contains("com.acme.Order#total"));
    }

    #[test]
    fn test_make_mapping_error_uses_origin() {
        let context = BindingContext::new(Origin::document("orders.json"));
        let err = context.make_mapping_error("broken");
        assert_eq!(err.origin, Origin::document("orders.json"));
        assert_eq!(err.message, "broken");
    }
}
