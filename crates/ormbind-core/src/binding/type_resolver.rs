//! Explicit value type resolution.
//!
//! Resolvers form a chain: the first one that produces a type name wins. The chain is
//! evaluated once while the attribute is built and the result is stored on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attribute::MappedAttribute;
use crate::annotation::names::vendor;
use crate::error::{AnnotationError, MappingError};

/// Value type chosen for an attribute, if any resolver picked one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedType {
    /// Type name; `None` lets the engine infer it from the declared type.
    pub name: Option<String>,
    /// Type parameters.
    pub parameters: BTreeMap<String, String>,
}

impl ResolvedType {
    /// Resolved type with a name and no parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parameters: BTreeMap::new(),
        }
    }

    /// Whether a resolver chose a type.
    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }
}

/// One link in the type resolution chain.
pub trait AttributeTypeResolver: Send + Sync {
    /// Resolve the value type of `attribute`. An unresolved result defers to the next link.
    fn resolve(&self, attribute: &MappedAttribute) -> Result<ResolvedType, MappingError>;
}

/// Reads the vendor type directive (`type` plus `parameters`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitTypeResolver;

impl AttributeTypeResolver for ExplicitTypeResolver {
    fn resolve(&self, attribute: &MappedAttribute) -> Result<ResolvedType, MappingError> {
        let Some(type_annotation) = attribute.annotation(vendor::TYPE)? else {
            return Ok(ResolvedType::default());
        };
        let lookup_error =
            |e: AnnotationError| attribute.context().annotation_error(&attribute.role(), e);

        let name = type_annotation
            .string("type")
            .map_err(lookup_error)?
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut parameters = BTreeMap::new();
        for parameter in type_annotation.nested_array("parameters").map_err(lookup_error)? {
            let key = parameter.string("name").map_err(lookup_error)?;
            let value = parameter.string("value").map_err(lookup_error)?;
            if let (Some(key), Some(value)) = (key, value) {
                parameters.insert(key.to_string(), value.to_string());
            }
        }

        Ok(ResolvedType { name, parameters })
    }
}

/// Ordered chain of resolvers.
#[derive(Default)]
pub struct CompositeTypeResolver {
    resolvers: Vec<Box<dyn AttributeTypeResolver>>,
}

impl CompositeTypeResolver {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver to the chain.
    pub fn with(mut self, resolver: impl AttributeTypeResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl AttributeTypeResolver for CompositeTypeResolver {
    fn resolve(&self, attribute: &MappedAttribute) -> Result<ResolvedType, MappingError> {
        for resolver in &self.resolvers {
            let resolved = resolver.resolve(attribute)?;
            if resolved.is_resolved() {
                return Ok(resolved);
            }
        }
        Ok(ResolvedType::default())
    }
}

/// The chain association attributes use unless the caller supplies one.
pub fn default_association_type_resolver() -> CompositeTypeResolver {
    CompositeTypeResolver::new().with(ExplicitTypeResolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationInstance, AnnotationSet};
    use crate::binding::context::BindingContext;
    use crate::binding::nature::{AccessType, AttributeNature};
    use crate::error::Origin;

    struct FixedResolver(&'static str);

    impl AttributeTypeResolver for FixedResolver {
        fn resolve(&self, _attribute: &MappedAttribute) -> Result<ResolvedType, MappingError> {
            Ok(ResolvedType::named(self.0))
        }
    }

    fn attribute(annotations: AnnotationSet) -> MappedAttribute {
        MappedAttribute::new(
            "status",
            "com.acme.Status",
            AttributeNature::Basic,
            AccessType::Field,
            annotations,
            BindingContext::new(Origin::class("com.acme.Order")),
        )
        .unwrap()
    }

    #[test]
    fn test_explicit_type_with_parameters() {
        let annotations = AnnotationSet::new().with(
            AnnotationInstance::new(vendor::TYPE)
                .with_string("type", "com.acme.StatusType")
                .with_nested_array(
                    "parameters",
                    [AnnotationInstance::new(vendor::PARAMETER)
                        .with_string("name", "column")
                        .with_string("value", "status_code")],
                ),
        );
        let attr = attribute(annotations);

        let resolved = attr.resolved_type();
        assert_eq!(resolved.name.as_deref(), Some("com.acme.StatusType"));
        assert_eq!(resolved.parameters.get("column").map(String::as_str), Some("status_code"));
    }

    #[test]
    fn test_composite_first_resolved_wins() {
        let attr = attribute(AnnotationSet::new());
        let chain = CompositeTypeResolver::new()
            .with(ExplicitTypeResolver)
            .with(FixedResolver("first"))
            .with(FixedResolver("second"));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.resolve(&attr).unwrap().name.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_chain_leaves_type_unresolved() {
        let attr = attribute(AnnotationSet::new());
        assert!(!CompositeTypeResolver::new().resolve(&attr).unwrap().is_resolved());
    }
}
