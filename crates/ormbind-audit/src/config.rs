//! Audit configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ormbind_core::binding::{AttributeNature, EntityBinding};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a property relates to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Many-to-one or one-to-one owning side.
    ToOne,
    /// Inverse side of a to-one (not stored on this entity).
    ToOneNotOwning,
    /// A collection of entities.
    ToMany,
}

/// Audit metadata for one relation property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescription {
    /// Relation kind.
    pub kind: RelationKind,
    /// Referenced entity name.
    pub to_entity: String,
    /// Collection property on the referenced entity that maps this relation back.
    #[serde(default)]
    pub mapped_by: Option<String>,
    /// Whether the other side maps this relation back.
    #[serde(default)]
    pub bidirectional: bool,
    /// Whether the foreign key is written by this side.
    #[serde(default = "default_true")]
    pub insertable: bool,
}

fn default_true() -> bool {
    true
}

impl RelationDescription {
    /// A unidirectional to-one relation.
    pub fn to_one(to_entity: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::ToOne,
            to_entity: to_entity.into(),
            mapped_by: None,
            bidirectional: false,
            insertable: true,
        }
    }

    /// A collection relation.
    pub fn to_many(to_entity: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::ToMany,
            ..Self::to_one(to_entity)
        }
    }

    /// Mark the relation bidirectional, mapped back by `collection` on the target.
    pub fn mapped_by(mut self, collection: impl Into<String>) -> Self {
        self.mapped_by = Some(collection.into());
        self.bidirectional = true;
        self
    }

    /// Set whether this side writes the foreign key.
    pub fn with_insertable(mut self, insertable: bool) -> Self {
        self.insertable = insertable;
        self
    }

    /// Whether a change of this property must be reflected on the other side's collection.
    pub fn is_bidirectional_to_one(&self) -> bool {
        self.kind == RelationKind::ToOne && self.bidirectional && self.insertable
    }
}

/// Audit configuration of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditedEntity {
    /// Properties excluded from auditing.
    pub not_audited: BTreeSet<String>,
    /// Relation properties.
    pub relations: BTreeMap<String, RelationDescription>,
    /// Track per-property modified flags for this entity.
    pub with_modified_flag: bool,
}

impl AuditedEntity {
    /// Audit every property.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a property from auditing.
    pub fn with_not_audited(mut self, property: impl Into<String>) -> Self {
        self.not_audited.insert(property.into());
        self
    }

    /// Describe a relation property.
    pub fn with_relation(mut self, property: impl Into<String>, relation: RelationDescription) -> Self {
        self.relations.insert(property.into(), relation);
        self
    }

    /// Track modified flags.
    pub fn with_modified_flag(mut self, enabled: bool) -> Self {
        self.with_modified_flag = enabled;
        self
    }

    /// Whether `property` is audited.
    pub fn is_audited(&self, property: &str) -> bool {
        !self.not_audited.contains(property)
    }
}

/// Global audit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Audited entities by name.
    pub entities: BTreeMap<String, AuditedEntity>,
    /// Emit collection-change work units for the inverse side of bidirectional relations.
    pub generate_revisions_for_collections: bool,
    /// Keep the entity data in DEL audit rows.
    pub store_data_at_delete: bool,
    /// Suffix appended to an entity name to form its audit entity name.
    pub audit_table_suffix: String,
    /// Name of the revision column in audit rows.
    pub revision_field_name: String,
    /// Name of the revision type column in audit rows.
    pub revision_type_field_name: String,
    /// Track modified flags for every audited entity.
    pub global_with_modified_flag: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            generate_revisions_for_collections: true,
            store_data_at_delete: false,
            audit_table_suffix: "_AUD".to_string(),
            revision_field_name: "REV".to_string(),
            revision_type_field_name: "REVTYPE".to_string(),
            global_with_modified_flag: false,
        }
    }
}

impl AuditConfig {
    /// Create the default configuration with no audited entities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Derive a configuration auditing every bound entity.
    ///
    /// To-one associations become relation descriptions; they are bidirectional when the
    /// target entity has a collection whose `mappedBy` names them.
    pub fn from_bindings<'a>(bindings: impl IntoIterator<Item = &'a EntityBinding>) -> Self {
        let bindings: Vec<&EntityBinding> = bindings.into_iter().collect();
        let mut config = Self::default();

        for binding in &bindings {
            let mut entity = AuditedEntity::new();
            for association in binding.associations() {
                let target = association.referenced_entity_type();
                let relation = match association.nature() {
                    AttributeNature::ManyToOne | AttributeNature::OneToOne
                        if association.mapped_by().is_some() =>
                    {
                        RelationDescription {
                            kind: RelationKind::ToOneNotOwning,
                            ..RelationDescription::to_one(target)
                        }
                    }
                    AttributeNature::ManyToOne | AttributeNature::OneToOne => {
                        let inverse = bindings
                            .iter()
                            .find(|b| b.name() == target)
                            .and_then(|b| {
                                b.associations().find(|a| {
                                    a.mapped_by() == Some(association.name())
                                        && a.referenced_entity_type() == binding.name()
                                })
                            });
                        let relation = RelationDescription::to_one(target)
                            .with_insertable(association.is_insertable());
                        match inverse {
                            Some(collection) => relation.mapped_by(collection.name()),
                            None => relation,
                        }
                    }
                    _ => RelationDescription::to_many(target),
                };
                entity = entity.with_relation(association.name(), relation);
            }
            config.entities.insert(binding.name().to_string(), entity);
        }

        config
    }

    /// Audit an entity.
    pub fn with_entity(mut self, name: impl Into<String>, entity: AuditedEntity) -> Self {
        self.entities.insert(name.into(), entity);
        self
    }

    /// Enable or disable collection-change work units.
    pub fn with_generate_revisions_for_collections(mut self, enabled: bool) -> Self {
        self.generate_revisions_for_collections = enabled;
        self
    }

    /// Keep entity data in DEL rows.
    pub fn with_store_data_at_delete(mut self, enabled: bool) -> Self {
        self.store_data_at_delete = enabled;
        self
    }

    /// Set the audit entity suffix.
    pub fn with_audit_table_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.audit_table_suffix = suffix.into();
        self
    }

    /// Track modified flags for every entity.
    pub fn with_global_modified_flag(mut self, enabled: bool) -> Self {
        self.global_with_modified_flag = enabled;
        self
    }

    /// Whether `entity` is audited.
    pub fn is_audited(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Audit configuration of `entity`.
    pub fn entity(&self, entity: &str) -> Option<&AuditedEntity> {
        self.entities.get(entity)
    }

    /// Whether `property` of `entity` is audited.
    pub fn is_property_audited(&self, entity: &str, property: &str) -> bool {
        self.entity(entity).is_some_and(|e| e.is_audited(property))
    }

    /// Relation description of a property.
    pub fn relation(&self, entity: &str, property: &str) -> Option<&RelationDescription> {
        self.entity(entity).and_then(|e| e.relations.get(property))
    }

    /// Whether modified flags are tracked for `entity`.
    pub fn tracks_modified_flags(&self, entity: &str) -> bool {
        self.global_with_modified_flag || self.entity(entity).is_some_and(|e| e.with_modified_flag)
    }

    /// Audit entity name for `entity`.
    pub fn audit_entity_name(&self, entity: &str) -> String {
        format!("{}{}", entity, self.audit_table_suffix)
    }
}
