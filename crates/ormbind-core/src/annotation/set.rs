//! Per-attribute annotation index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AnnotationInstance;
use crate::error::AnnotationError;

/// All annotations found on one attribute, keyed by qualified name.
///
/// Serialized as a flat list of instances.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<AnnotationInstance>", into = "Vec<AnnotationInstance>")]
pub struct AnnotationSet {
    annotations: BTreeMap<String, Vec<AnnotationInstance>>,
}

impl AnnotationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance (builder form).
    pub fn with(mut self, instance: AnnotationInstance) -> Self {
        self.insert(instance);
        self
    }

    /// Add an instance.
    pub fn insert(&mut self, instance: AnnotationInstance) {
        self.annotations
            .entry(instance.name.clone())
            .or_default()
            .push(instance);
    }

    /// All instances of an annotation.
    pub fn get(&self, name: &str) -> &[AnnotationInstance] {
        self.annotations.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single instance of an annotation, if present.
    ///
    /// Fails when the annotation occurs more than once.
    pub fn single(&self, name: &str) -> Result<Option<&AnnotationInstance>, AnnotationError> {
        match self.get(name) {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            many => Err(AnnotationError::Duplicate {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Check whether an annotation is present.
    pub fn contains(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    /// Qualified names of all present annotations.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.annotations.keys().map(String::as_str)
    }

    /// Number of distinct annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Apply an override source on top of this set.
    ///
    /// Every annotation named in `overrides` replaces all instances of the same name
    /// here; annotations not named in `overrides` are kept.
    pub fn overlay(&mut self, overrides: &AnnotationSet) {
        for (name, instances) in &overrides.annotations {
            self.annotations.insert(name.clone(), instances.clone());
        }
    }

    /// Consume the set and return it with `overrides` applied.
    pub fn overlaid(mut self, overrides: &AnnotationSet) -> Self {
        self.overlay(overrides);
        self
    }
}

impl From<Vec<AnnotationInstance>> for AnnotationSet {
    fn from(instances: Vec<AnnotationInstance>) -> Self {
        instances.into_iter().collect()
    }
}

impl From<AnnotationSet> for Vec<AnnotationInstance> {
    fn from(set: AnnotationSet) -> Self {
        set.annotations.into_values().flatten().collect()
    }
}

impl FromIterator<AnnotationInstance> for AnnotationSet {
    fn from_iter<T: IntoIterator<Item = AnnotationInstance>>(iter: T) -> Self {
        let mut set = AnnotationSet::new();
        for instance in iter {
            set.insert(instance);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::names::jpa;

    #[test]
    fn test_single_lookup() {
        let set = AnnotationSet::new().with(AnnotationInstance::new(jpa::MANY_TO_ONE));
        assert!(set.single(jpa::MANY_TO_ONE).unwrap().is_some());
        assert!(set.single(jpa::JOIN_TABLE).unwrap().is_none());
    }

    #[test]
    fn test_single_rejects_duplicates() {
        let set = AnnotationSet::new()
            .with(AnnotationInstance::new(jpa::JOIN_COLUMN).with_string("name", "a"))
            .with(AnnotationInstance::new(jpa::JOIN_COLUMN).with_string("name", "b"));
        let err = set.single(jpa::JOIN_COLUMN).unwrap_err();
        assert_eq!(
            err,
            AnnotationError::Duplicate {
                name: jpa::JOIN_COLUMN.to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_overlay_replaces_by_name() {
        let mut base = AnnotationSet::new()
            .with(AnnotationInstance::new(jpa::MANY_TO_ONE).with_enum("fetch", "EAGER"))
            .with(AnnotationInstance::new(jpa::JOIN_COLUMN).with_string("name", "owner_id"));
        let overrides = AnnotationSet::new()
            .with(AnnotationInstance::new(jpa::MANY_TO_ONE).with_enum("fetch", "LAZY"));

        base.overlay(&overrides);

        let many_to_one = base.single(jpa::MANY_TO_ONE).unwrap().unwrap();
        assert_eq!(many_to_one.value("fetch").and_then(|v| v.as_enum()), Some("LAZY"));
        assert!(base.contains(jpa::JOIN_COLUMN));
    }

    #[test]
    fn test_serializes_as_list() {
        let set = AnnotationSet::new().with(AnnotationInstance::new(jpa::ID));
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        let back: AnnotationSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
