//! ORMBIND Core - annotation model, attribute binding and association resolution.
//!
//! This crate turns annotation indexes and JSON mapping documents into the mapped
//! attribute model an ORM engine consumes, and defines the runtime [`Value`] carried in
//! entity state snapshots.

pub mod annotation;
pub mod binding;
pub mod document;
pub mod error;
pub mod value;

pub use annotation::{AnnotationInstance, AnnotationSet, AnnotationValue};
pub use binding::{
    AccessType, AssociationAttribute, AttributeDescriptor, AttributeNature, AttributeTypeResolver,
    BinderConfig, BindingContext, BoundAttribute, CascadeType, Column, CompositeTypeResolver,
    EntityBinder, EntityBinding, EntityDescriptor, FetchMode, FetchStyle, FetchType,
    MappedAttribute, MappingMessageLogger, RecordingMessageLogger, ResolvedType,
    TracingMessageLogger, VendorCascadeType,
};
pub use document::{DocumentBinding, MappingDocument};
pub use error::{AnnotationError, BindingErrors, Error, MappingError, Origin, OriginKind, Result};
pub use value::{EntityId, Value};
