//! Attribute binding.
//!
//! Turns annotation sets into the mapped attribute model: plain attributes, resolved
//! associations, and whole entity bindings.

mod association;
mod attribute;
mod cascade;
mod column;
mod context;
mod entity;
mod fetch;
mod nature;
mod rules;
mod type_resolver;

pub use association::{determine_explicit_join_table, AssociationAttribute};
pub use attribute::{AttributeDescriptor, MappedAttribute};
pub use cascade::{CascadeType, VendorCascadeType};
pub use column::Column;
pub use context::{BindingContext, MappingMessageLogger, RecordingMessageLogger, TracingMessageLogger};
pub use entity::{BinderConfig, BoundAttribute, EntityBinder, EntityBinding, EntityDescriptor};
pub use fetch::{FetchMode, FetchStyle, FetchType, LazyToOneOption, NotFoundAction};
pub use nature::{AccessType, AttributeNature};
pub use rules::{apply_rules, OverrideRule, RuleFn, RuleInput};
pub use type_resolver::{
    default_association_type_resolver, AttributeTypeResolver, CompositeTypeResolver,
    ExplicitTypeResolver, ResolvedType,
};
