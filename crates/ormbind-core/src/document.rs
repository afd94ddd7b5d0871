//! JSON mapping documents.
//!
//! A mapping document describes entities the same way the scanner does (attribute
//! descriptors with annotation sets) and may carry per-attribute `overrides` that replace
//! same-named annotations. Errors raised while binding a document entity are reported
//! against the document, not the class.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::binding::{EntityBinder, EntityBinding, EntityDescriptor};
use crate::error::{BindingErrors, Origin, Result};

/// A parsed mapping document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Document name used in error origins; defaults to the file path when loaded from disk.
    #[serde(default)]
    pub name: Option<String>,
    /// Mapped entities.
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

/// Outcome of binding every entity of a document.
#[derive(Debug, Default)]
pub struct DocumentBinding {
    /// Entities that bound cleanly, in document order.
    pub bindings: Vec<EntityBinding>,
    /// Per-entity error sets, in document order.
    pub failures: Vec<BindingErrors>,
}

impl DocumentBinding {
    /// Whether every entity bound.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of mapping errors.
    pub fn error_count(&self) -> usize {
        self.failures.iter().map(BindingErrors::len).sum()
    }

    /// Look up a bound entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }
}

impl MappingDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            entities: Vec::new(),
        }
    }

    /// Add an entity.
    pub fn with_entity(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut document = Self::from_json(&text)?;
        if document.name.is_none() {
            document.name = Some(path.display().to_string());
        }
        debug!(path = %path.display(), entities = document.entities.len(), "mapping document loaded");
        Ok(document)
    }

    /// Serialize the document to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Origin reported for errors in this document.
    pub fn origin(&self) -> Origin {
        Origin::document(self.name.clone().unwrap_or_else(|| "<inline>".to_string()))
    }

    /// Bind every entity, collecting failures per entity.
    pub fn bind(&self, binder: &EntityBinder) -> DocumentBinding {
        let origin = self.origin();
        let mut outcome = DocumentBinding::default();

        for entity in &self.entities {
            match binder.bind_with_origin(entity, origin.clone()) {
                Ok(binding) => outcome.bindings.push(binding),
                Err(errors) => outcome.failures.push(errors),
            }
        }

        info!(
            document = %origin.name,
            bound = outcome.bindings.len(),
            failed = outcome.failures.len(),
            "mapping document bound"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::AttributeNature;

    const ORDERS: &str = r#"{
        "name": "orders.json",
        "entities": [
            {
                "name": "com.acme.Order",
                "attributes": [
                    {
                        "name": "id",
                        "declared_type": "long",
                        "nature": "basic",
                        "annotations": [{ "name": "javax.persistence.Id" }]
                    },
                    {
                        "name": "customer",
                        "declared_type": "com.acme.Customer",
                        "nature": "many_to_one",
                        "annotations": [
                            {
                                "name": "javax.persistence.ManyToOne",
                                "values": { "fetch": { "kind": "enum", "value": "EAGER" } }
                            }
                        ],
                        "overrides": [
                            {
                                "name": "javax.persistence.ManyToOne",
                                "values": { "fetch": { "kind": "enum", "value": "LAZY" } }
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_bind() {
        let document = MappingDocument::from_json(ORDERS).unwrap();
        assert_eq!(document.entities.len(), 1);
        assert_eq!(document.entities[0].attributes[1].nature, AttributeNature::ManyToOne);

        let outcome = document.bind(&EntityBinder::default());
        assert!(outcome.is_success());
        let order = outcome.entity("com.acme.Order").unwrap();
        assert!(order.association("customer").unwrap().is_lazy());
    }

    #[test]
    fn test_failures_report_document_origin() {
        let json = r#"{
            "name": "broken.json",
            "entities": [
                { "name": "A", "attributes": [
                    { "name": "items", "declared_type": "java.util.Set", "nature": "one_to_many" }
                ] },
                { "name": "B", "attributes": [] }
            ]
        }"#;
        let outcome = MappingDocument::from_json(json).unwrap().bind(&EntityBinder::default());

        assert!(!outcome.is_success());
        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.error_count(), 1);
        assert_eq!(outcome.failures[0].errors[0].origin, Origin::document("broken.json"));
    }

    #[test]
    fn test_invalid_json_is_document_error() {
        let err = MappingDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, crate::error::Error::Document(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_entities() {
        let document = MappingDocument::from_json(ORDERS).unwrap();
        let reparsed = MappingDocument::from_json(&document.to_json().unwrap()).unwrap();
        assert_eq!(document, reparsed);
    }
}
