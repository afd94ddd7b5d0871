//! Audit work units.
//!
//! A work unit is the pending audit row for one entity instance in one session. Units for
//! the same instance are merged rather than queued twice; [`AuditWorkUnit::merge`] holds
//! the rules.

use std::collections::{BTreeMap, BTreeSet};

use ormbind_core::{EntityId, Value};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::record::{AuditRecord, RevisionType};
use crate::revision::Revision;
use crate::session::{EntityPersister, SessionId};

/// Audited property values keyed by property name.
pub type AuditData = BTreeMap<String, Value>;

/// Kind of a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkUnitKind {
    /// Entity inserted.
    Add,
    /// Entity updated.
    Mod,
    /// Entity deleted.
    Del,
    /// A collection of the entity changed because the owning side of a relation moved.
    CollectionChange,
}

impl WorkUnitKind {
    /// Revision type of the row this unit produces.
    pub fn revision_type(&self) -> RevisionType {
        match self {
            WorkUnitKind::Add => RevisionType::Add,
            WorkUnitKind::Mod | WorkUnitKind::CollectionChange => RevisionType::Mod,
            WorkUnitKind::Del => RevisionType::Del,
        }
    }
}

impl std::fmt::Display for WorkUnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkUnitKind::Add => write!(f, "add"),
            WorkUnitKind::Mod => write!(f, "mod"),
            WorkUnitKind::Del => write!(f, "del"),
            WorkUnitKind::CollectionChange => write!(f, "collection-change"),
        }
    }
}

/// Result of merging a later unit into an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The earlier unit stays queued (possibly updated in place).
    Kept,
    /// The earlier unit is replaced by this one.
    Replaced(AuditWorkUnit),
    /// Both units cancel out.
    Dropped,
}

/// Pending audit row for one entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditWorkUnit {
    kind: WorkUnitKind,
    session: SessionId,
    entity_name: String,
    id: EntityId,
    data: AuditData,
    old_data: Option<AuditData>,
    modified: BTreeSet<String>,
    changed_collections: BTreeSet<String>,
}

impl AuditWorkUnit {
    /// Unit for an inserted entity.
    pub fn add(
        session: SessionId,
        config: &AuditConfig,
        persister: &dyn EntityPersister,
        id: EntityId,
        state: &[Value],
    ) -> Result<Self> {
        let data = project(config, persister, state)?;
        let modified = changed_properties(&data, None);
        Ok(Self {
            kind: WorkUnitKind::Add,
            session,
            entity_name: persister.entity_name().to_string(),
            id,
            data,
            old_data: None,
            modified,
            changed_collections: BTreeSet::new(),
        })
    }

    /// Unit for an updated entity. `new_state` must already carry the database values
    /// of non-updatable properties.
    pub fn modification(
        session: SessionId,
        config: &AuditConfig,
        persister: &dyn EntityPersister,
        id: EntityId,
        new_state: &[Value],
        old_state: Option<&[Value]>,
    ) -> Result<Self> {
        let data = project(config, persister, new_state)?;
        let old_data = old_state
            .map(|old| project(config, persister, old))
            .transpose()?;
        let modified = changed_properties(&data, old_data.as_ref());
        Ok(Self {
            kind: WorkUnitKind::Mod,
            session,
            entity_name: persister.entity_name().to_string(),
            id,
            data,
            old_data,
            modified,
            changed_collections: BTreeSet::new(),
        })
    }

    /// Unit for a deleted entity. The row keeps the entity data only when the
    /// configuration asks for it.
    pub fn deletion(
        session: SessionId,
        config: &AuditConfig,
        persister: &dyn EntityPersister,
        id: EntityId,
        state: &[Value],
    ) -> Result<Self> {
        let deleted = project(config, persister, state)?;
        let data = if config.store_data_at_delete {
            deleted.clone()
        } else {
            AuditData::new()
        };
        Ok(Self {
            kind: WorkUnitKind::Del,
            session,
            entity_name: persister.entity_name().to_string(),
            id,
            data,
            old_data: Some(deleted),
            modified: BTreeSet::new(),
            changed_collections: BTreeSet::new(),
        })
    }

    /// Unit recording that `collection` of the referenced instance changed.
    pub fn collection_change(
        session: SessionId,
        entity_name: impl Into<String>,
        id: EntityId,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            kind: WorkUnitKind::CollectionChange,
            session,
            entity_name: entity_name.into(),
            id,
            data: AuditData::new(),
            old_data: None,
            modified: BTreeSet::new(),
            changed_collections: BTreeSet::from([collection.into()]),
        }
    }

    /// Unit kind.
    pub fn kind(&self) -> WorkUnitKind {
        self.kind
    }

    /// Session the unit belongs to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Entity name.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Entity identifier.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Audited data written to the row.
    pub fn data(&self) -> &AuditData {
        &self.data
    }

    /// Audited data before the change, when known.
    pub fn old_data(&self) -> Option<&AuditData> {
        self.old_data.as_ref()
    }

    /// Properties whose value changed.
    pub fn modified(&self) -> &BTreeSet<String> {
        &self.modified
    }

    /// Collection properties flagged as changed.
    pub fn changed_collections(&self) -> &BTreeSet<String> {
        &self.changed_collections
    }

    /// Whether performing this unit would write anything.
    pub fn contains_work(&self) -> bool {
        match self.kind {
            WorkUnitKind::Mod => !self.modified.is_empty(),
            WorkUnitKind::Add | WorkUnitKind::Del | WorkUnitKind::CollectionChange => true,
        }
    }

    /// Merge `second`, raised later for the same instance, into this unit.
    pub fn merge(&mut self, second: AuditWorkUnit) -> MergeOutcome {
        use WorkUnitKind::{Add, CollectionChange, Del, Mod};

        match (self.kind, second.kind) {
            (Add, Add) | (Mod, Del) | (CollectionChange, Del) => MergeOutcome::Replaced(second),
            (Add, Del) | (Del, Mod) => MergeOutcome::Dropped,
            (Mod, Add) | (Del, Del) | (Del, CollectionChange) => MergeOutcome::Kept,
            (Add, CollectionChange) | (Mod, CollectionChange) | (CollectionChange, CollectionChange) => {
                self.changed_collections.extend(second.changed_collections);
                MergeOutcome::Kept
            }
            (Add, Mod) => {
                let mut merged = second;
                merged.kind = Add;
                merged.old_data = None;
                merged.modified = changed_properties(&merged.data, None);
                merged.inherit_collections(self);
                MergeOutcome::Replaced(merged)
            }
            (Mod, Mod) => {
                let mut merged = second;
                merged.old_data = self.old_data.take();
                merged.modified = changed_properties(&merged.data, merged.old_data.as_ref());
                merged.inherit_collections(self);
                MergeOutcome::Replaced(merged)
            }
            (Del, Add) => {
                if self.old_data.as_ref() == Some(&second.data) {
                    return MergeOutcome::Dropped;
                }
                let mut merged = second;
                merged.kind = Mod;
                merged.old_data = self.old_data.take();
                merged.modified = changed_properties(&merged.data, merged.old_data.as_ref());
                MergeOutcome::Replaced(merged)
            }
            (CollectionChange, Add) | (CollectionChange, Mod) => {
                let mut merged = second;
                merged.inherit_collections(self);
                MergeOutcome::Replaced(merged)
            }
        }
    }

    fn inherit_collections(&mut self, earlier: &AuditWorkUnit) {
        self.changed_collections
            .extend(earlier.changed_collections.iter().cloned());
    }

    /// Build the audit row for `revision`.
    pub fn to_record(&self, config: &AuditConfig, revision: &Revision) -> AuditRecord {
        let modified = if self.kind == WorkUnitKind::CollectionChange
            || config.tracks_modified_flags(&self.entity_name)
        {
            self.modified
                .iter()
                .chain(&self.changed_collections)
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        AuditRecord {
            revision: revision.number,
            timestamp: revision.timestamp,
            revision_type: self.kind.revision_type(),
            entity_name: self.entity_name.clone(),
            audit_entity_name: config.audit_entity_name(&self.entity_name),
            entity_id: self.id.clone(),
            data: self
                .data
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            modified,
        }
    }
}

/// Audited subset of a state snapshot.
fn project(config: &AuditConfig, persister: &dyn EntityPersister, state: &[Value]) -> Result<AuditData> {
    let names = persister.property_names();
    if names.len() != state.len() {
        return Err(AuditError::StateLength {
            entity: persister.entity_name().to_string(),
            expected: names.len(),
            found: state.len(),
        });
    }

    let entity = persister.entity_name();
    Ok(names
        .iter()
        .zip(state)
        .filter(|(name, _)| config.is_property_audited(entity, name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect())
}

/// Properties of `data` that differ from `old`; without an old snapshot, every non-null one.
fn changed_properties(data: &AuditData, old: Option<&AuditData>) -> BTreeSet<String> {
    data.iter()
        .filter(|(name, value)| match old {
            Some(old) => old.get(*name) != Some(*value),
            None => !value.is_null(),
        })
        .map(|(name, _)| name.clone())
        .collect()
}
