//! Audit rows.

use ormbind_core::{EntityId, Value};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::error::{AuditError, Result};

/// Kind of change an audit row records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevisionType {
    /// Entity inserted.
    Add,
    /// Entity or one of its collections modified.
    Mod,
    /// Entity deleted.
    Del,
}

impl RevisionType {
    /// Stored code: ADD = 0, MOD = 1, DEL = 2.
    pub fn code(&self) -> u8 {
        match self {
            RevisionType::Add => 0,
            RevisionType::Mod => 1,
            RevisionType::Del => 2,
        }
    }

    /// Parse a stored code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RevisionType::Add),
            1 => Some(RevisionType::Mod),
            2 => Some(RevisionType::Del),
            _ => None,
        }
    }
}

impl std::fmt::Display for RevisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevisionType::Add => write!(f, "ADD"),
            RevisionType::Mod => write!(f, "MOD"),
            RevisionType::Del => write!(f, "DEL"),
        }
    }
}

/// One audit row.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct AuditRecord {
    /// Revision number.
    pub revision: u64,
    /// Revision timestamp (microseconds since the Unix epoch).
    pub timestamp: u64,
    /// Kind of change.
    pub revision_type: RevisionType,
    /// Audited entity name.
    pub entity_name: String,
    /// Audit entity (table) name.
    pub audit_entity_name: String,
    /// Identifier of the audited instance.
    pub entity_id: EntityId,
    /// Audited property values, sorted by property name.
    pub data: Vec<(String, Value)>,
    /// Properties flagged as modified.
    pub modified: Vec<String>,
}

impl AuditRecord {
    /// Value of an audited property.
    pub fn value(&self, property: &str) -> Option<&Value> {
        self.data.iter().find(|(name, _)| name == property).map(|(_, v)| v)
    }

    /// Whether `property` is flagged as modified.
    pub fn is_modified(&self, property: &str) -> bool {
        self.modified.iter().any(|m| m == property)
    }

    /// Encode the record with rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|bytes| bytes.to_vec())
            .map_err(|e| AuditError::Serialization(e.to_string()))
    }

    /// Decode a record produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let archived = rkyv::access::<ArchivedAuditRecord, rkyv::rancor::Error>(bytes)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        rkyv::deserialize::<AuditRecord, rkyv::rancor::Error>(archived)
            .map_err(|e| AuditError::Serialization(e.to_string()))
    }
}
