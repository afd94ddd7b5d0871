//! Annotation source model.
//!
//! The scanning library that discovers annotations is an external collaborator. What it
//! hands to the binder is an index per attribute: qualified annotation name mapped to the
//! instances found, each instance exposing named values of a few kinds (string, class,
//! enum, boolean, nested annotation arrays). This module is that index plus the typed
//! lookups the resolver needs.
//!
//! # Example
//!
//! ```
//! use ormbind_core::annotation::{names, AnnotationInstance, AnnotationSet};
//!
//! let set = AnnotationSet::new()
//!     .with(AnnotationInstance::new(names::jpa::MANY_TO_ONE).with_enum("fetch", "LAZY"))
//!     .with(AnnotationInstance::new(names::jpa::JOIN_COLUMN).with_string("name", "customer_id"));
//!
//! assert!(set.contains(names::jpa::MANY_TO_ONE));
//! assert_eq!(set.len(), 2);
//! ```

mod instance;
pub mod names;
mod set;
mod value;

pub use instance::AnnotationInstance;
pub use set::AnnotationSet;
pub use value::AnnotationValue;
