//! Mapped attribute base model.

use serde::{Deserialize, Serialize};

use super::context::BindingContext;
use super::nature::{AccessType, AttributeNature};
use super::type_resolver::{AttributeTypeResolver, ExplicitTypeResolver, ResolvedType};
use crate::annotation::names::{jpa, vendor};
use crate::annotation::{AnnotationInstance, AnnotationSet};
use crate::error::MappingError;

/// Input describing one attribute, as handed over by the scanner or a mapping document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Attribute name.
    pub name: String,
    /// Declared (static) type name.
    pub declared_type: String,
    /// Element or target type for collections, when the scanner knows it.
    #[serde(default)]
    pub referenced_type: Option<String>,
    /// Attribute nature.
    pub nature: AttributeNature,
    /// Access strategy.
    #[serde(default)]
    pub access_type: AccessType,
    /// Annotations found on the attribute.
    #[serde(default)]
    pub annotations: AnnotationSet,
    /// Override annotations (replace same-named entries of `annotations`).
    #[serde(default)]
    pub overrides: AnnotationSet,
}

impl AttributeDescriptor {
    /// Create a descriptor with no annotations.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        nature: AttributeNature,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            referenced_type: None,
            nature,
            access_type: AccessType::default(),
            annotations: AnnotationSet::new(),
            overrides: AnnotationSet::new(),
        }
    }

    /// Set the referenced (element) type.
    pub fn with_referenced_type(mut self, referenced_type: impl Into<String>) -> Self {
        self.referenced_type = Some(referenced_type.into());
        self
    }

    /// Set the access strategy.
    pub fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
        self
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.insert(annotation);
        self
    }

    /// Add an override annotation.
    pub fn with_override(mut self, annotation: AnnotationInstance) -> Self {
        self.overrides.insert(annotation);
        self
    }

    /// Annotations with overrides applied.
    pub fn effective_annotations(&self) -> AnnotationSet {
        self.annotations.clone().overlaid(&self.overrides)
    }
}

/// One persistent property of an entity.
#[derive(Debug, Clone)]
pub struct MappedAttribute {
    name: String,
    declared_type: String,
    access_type: AccessType,
    nature: AttributeNature,
    annotations: AnnotationSet,
    context: BindingContext,
    resolved_type: ResolvedType,
}

impl MappedAttribute {
    /// Create an attribute, resolving its explicit value type once.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        nature: AttributeNature,
        access_type: AccessType,
        annotations: AnnotationSet,
        context: BindingContext,
    ) -> Result<Self, MappingError> {
        let mut attribute = Self {
            name: name.into(),
            declared_type: declared_type.into(),
            access_type,
            nature,
            annotations,
            context,
            resolved_type: ResolvedType::default(),
        };
        attribute.resolved_type = ExplicitTypeResolver.resolve(&attribute)?;
        Ok(attribute)
    }

    /// Create an attribute from a descriptor, applying its overrides.
    pub fn from_descriptor(
        descriptor: &AttributeDescriptor,
        context: BindingContext,
    ) -> Result<Self, MappingError> {
        Self::new(
            descriptor.name.clone(),
            descriptor.declared_type.clone(),
            descriptor.nature,
            descriptor.access_type,
            descriptor.effective_annotations(),
            context,
        )
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (static) type name.
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Access strategy.
    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    /// Attribute nature.
    pub fn nature(&self) -> AttributeNature {
        self.nature
    }

    /// Raw annotation set.
    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    /// Owning binding context.
    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    /// `<origin>.<name>`, used in error messages.
    pub fn role(&self) -> String {
        format!("{}.{}", self.context.origin().name, self.name)
    }

    /// Explicit value type, resolved at construction.
    pub fn resolved_type(&self) -> &ResolvedType {
        &self.resolved_type
    }

    pub(crate) fn set_resolved_type(&mut self, resolved: ResolvedType) {
        self.resolved_type = resolved;
    }

    /// Single instance of an annotation, with lookup errors mapped to mapping errors.
    pub fn annotation(&self, name: &str) -> Result<Option<&AnnotationInstance>, MappingError> {
        self.annotations
            .single(name)
            .map_err(|e| self.context.annotation_error(&self.role(), e))
    }

    /// Whether the attribute is (part of) the identifier.
    pub fn is_id(&self) -> bool {
        self.annotations.contains(jpa::ID) || self.nature == AttributeNature::EmbeddedId
    }

    /// Default optimistic-lock rule: participates unless the optimistic-lock directive
    /// sets `excluded = true`.
    pub fn is_optimistic_lockable(&self) -> Result<bool, MappingError> {
        let excluded = match self.annotation(vendor::OPTIMISTIC_LOCK)? {
            Some(lock) => lock
                .boolean("excluded")
                .map_err(|e| self.context.annotation_error(&self.role(), e))?
                .unwrap_or(false),
            None => false,
        };
        Ok(!excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Origin;

    fn context() -> BindingContext {
        BindingContext::new(Origin::class("com.acme.Order"))
    }

    #[test]
    fn test_role_and_accessors() {
        let attr = MappedAttribute::new(
            "total",
            "java.math.BigDecimal",
            AttributeNature::Basic,
            AccessType::Property,
            AnnotationSet::new(),
            context(),
        )
        .unwrap();

        assert_eq!(attr.role(), "com.acme.Order.total");
        assert_eq!(attr.access_type(), AccessType::Property);
        assert!(!attr.is_id());
        assert!(attr.resolved_type().name.is_none());
    }

    #[test]
    fn test_optimistic_lock_exclusion() {
        let annotations = AnnotationSet::new()
            .with(AnnotationInstance::new(vendor::OPTIMISTIC_LOCK).with_bool("excluded", true));
        let attr = MappedAttribute::new(
            "notes",
            "java.lang.String",
            AttributeNature::Basic,
            AccessType::Field,
            annotations,
            context(),
        )
        .unwrap();
        assert!(!attr.is_optimistic_lockable().unwrap());
    }

    #[test]
    fn test_descriptor_overrides_apply() {
        let descriptor = AttributeDescriptor::new("notes", "java.lang.String", AttributeNature::Basic)
            .with_annotation(
                AnnotationInstance::new(vendor::OPTIMISTIC_LOCK).with_bool("excluded", true),
            )
            .with_override(
                AnnotationInstance::new(vendor::OPTIMISTIC_LOCK).with_bool("excluded", false),
            );
        let attr = MappedAttribute::from_descriptor(&descriptor, context()).unwrap();
        assert!(attr.is_optimistic_lockable().unwrap());
    }

    #[test]
    fn test_id_detection() {
        let annotations = AnnotationSet::new().with(AnnotationInstance::new(jpa::ID));
        let attr = MappedAttribute::new(
            "id",
            "long",
            AttributeNature::Basic,
            AccessType::Field,
            annotations,
            context(),
        )
        .unwrap();
        assert!(attr.is_id());
        assert!(attr.is_optimistic_lockable().unwrap());
    }
}
