//! Entity binding.
//!
//! The binder turns an [`EntityDescriptor`] into an [`EntityBinding`]: every attribute is
//! bound (associations through [`AssociationAttribute`], everything else as a plain
//! [`MappedAttribute`]), names are checked for uniqueness, and all mapping errors of the
//! entity are reported together.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::association::{determine_explicit_join_table, AssociationAttribute};
use super::attribute::{AttributeDescriptor, MappedAttribute};
use super::context::{BindingContext, MappingMessageLogger, TracingMessageLogger};
use super::nature::AttributeNature;
use super::type_resolver::{default_association_type_resolver, AttributeTypeResolver};
use crate::error::{BindingErrors, MappingError, Origin};

/// Binder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Stop at the first mapping error instead of collecting all of them.
    pub fail_fast: bool,
    /// Require at least one identifier attribute per entity.
    pub require_identifier: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            require_identifier: false,
        }
    }
}

impl BinderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first mapping error.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Require an identifier attribute.
    pub fn with_require_identifier(mut self, require: bool) -> Self {
        self.require_identifier = require;
        self
    }
}

/// Input describing one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Qualified entity name.
    pub name: String,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
}

impl EntityDescriptor {
    /// Create an entity with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add multiple attributes.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = AttributeDescriptor>) -> Self {
        self.attributes.extend(attributes);
        self
    }
}

/// One bound attribute.
#[derive(Debug, Clone)]
pub enum BoundAttribute {
    /// Basic, embedded or identifier attribute.
    Basic(MappedAttribute),
    /// Association or element collection.
    Association(AssociationAttribute),
}

impl BoundAttribute {
    /// Attribute name.
    pub fn name(&self) -> &str {
        self.attribute().name()
    }

    /// Attribute nature.
    pub fn nature(&self) -> AttributeNature {
        self.attribute().nature()
    }

    /// The underlying mapped attribute.
    pub fn attribute(&self) -> &MappedAttribute {
        match self {
            BoundAttribute::Basic(attribute) => attribute,
            BoundAttribute::Association(association) => association.attribute(),
        }
    }

    /// The association, if this attribute is one.
    pub fn as_association(&self) -> Option<&AssociationAttribute> {
        match self {
            BoundAttribute::Association(association) => Some(association),
            BoundAttribute::Basic(_) => None,
        }
    }

    /// Whether a change to this attribute bumps the owner's version.
    pub fn is_optimistic_lockable(&self) -> Result<bool, MappingError> {
        match self {
            BoundAttribute::Basic(attribute) => attribute.is_optimistic_lockable(),
            BoundAttribute::Association(association) => Ok(association.is_optimistic_lockable()),
        }
    }
}

/// The bound attribute set of one entity.
#[derive(Debug, Clone)]
pub struct EntityBinding {
    name: String,
    attributes: Vec<BoundAttribute>,
}

impl EntityBinding {
    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[BoundAttribute] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&BoundAttribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Look up an association by name.
    pub fn association(&self, name: &str) -> Option<&AssociationAttribute> {
        self.attribute(name).and_then(BoundAttribute::as_association)
    }

    /// All associations in declaration order.
    pub fn associations(&self) -> impl Iterator<Item = &AssociationAttribute> {
        self.attributes.iter().filter_map(BoundAttribute::as_association)
    }

    /// Identifier attributes.
    pub fn identifiers(&self) -> impl Iterator<Item = &MappedAttribute> {
        self.attributes
            .iter()
            .map(BoundAttribute::attribute)
            .filter(|a| a.is_id())
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the entity has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Binds entity descriptors.
///
/// A binder holds no per-entity state, so one instance can bind many entities; each
/// call creates its own [`BindingContext`].
pub struct EntityBinder {
    config: BinderConfig,
    logger: Arc<dyn MappingMessageLogger>,
    type_resolver: Arc<dyn AttributeTypeResolver>,
}

impl std::fmt::Debug for EntityBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityBinder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for EntityBinder {
    fn default() -> Self {
        Self::new(BinderConfig::default())
    }
}

impl EntityBinder {
    /// Create a binder with the tracing logger and the default type resolver chain.
    pub fn new(config: BinderConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingMessageLogger),
            type_resolver: Arc::new(default_association_type_resolver()),
        }
    }

    /// Use a different message logger.
    pub fn with_logger(mut self, logger: Arc<dyn MappingMessageLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Use a different association type resolver chain.
    pub fn with_type_resolver(mut self, resolver: Arc<dyn AttributeTypeResolver>) -> Self {
        self.type_resolver = resolver;
        self
    }

    /// Binder configuration.
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Bind an entity whose annotations come from its class.
    pub fn bind(&self, descriptor: &EntityDescriptor) -> Result<EntityBinding, BindingErrors> {
        self.bind_with_origin(descriptor, Origin::class(descriptor.name.clone()))
    }

    /// Bind an entity, reporting errors against `origin`.
    #[instrument(skip(self, descriptor), fields(entity = %descriptor.name))]
    pub fn bind_with_origin(
        &self,
        descriptor: &EntityDescriptor,
        origin: Origin,
    ) -> Result<EntityBinding, BindingErrors> {
        let context = BindingContext::with_logger(origin, self.logger.clone());
        let mut errors = Vec::new();
        let mut attributes = Vec::with_capacity(descriptor.attributes.len());
        let mut seen = HashSet::new();

        for attribute in &descriptor.attributes {
            if !seen.insert(attribute.name.as_str()) {
                errors.push(context.make_mapping_error(format!(
                    "Duplicate attribute name {} in entity {}",
                    attribute.name, descriptor.name
                )));
            } else {
                match self.bind_attribute(attribute, context.clone()) {
                    Ok(bound) => attributes.push(bound),
                    Err(err) => errors.push(err),
                }
            }
            if self.config.fail_fast && !errors.is_empty() {
                break;
            }
        }

        if errors.is_empty()
            && self.config.require_identifier
            && !attributes.iter().any(|a| a.attribute().is_id())
        {
            errors.push(context.make_mapping_error(format!(
                "No identifier specified for entity: {}",
                descriptor.name
            )));
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "entity binding failed");
            return Err(BindingErrors {
                entity: descriptor.name.clone(),
                errors,
            });
        }

        debug!(attributes = attributes.len(), "entity bound");
        Ok(EntityBinding {
            name: descriptor.name.clone(),
            attributes,
        })
    }

    fn bind_attribute(
        &self,
        descriptor: &AttributeDescriptor,
        context: BindingContext,
    ) -> Result<BoundAttribute, MappingError> {
        if descriptor.nature.is_association() {
            let association =
                AssociationAttribute::resolve_with(descriptor, context, self.type_resolver.as_ref())?;
            return Ok(BoundAttribute::Association(association));
        }

        let attribute = MappedAttribute::from_descriptor(descriptor, context)?;
        determine_explicit_join_table(&attribute)?;
        Ok(BoundAttribute::Basic(attribute))
    }
}
