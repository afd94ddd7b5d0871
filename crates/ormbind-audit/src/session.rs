//! Session and persister seams.
//!
//! The session/transaction manager and the entity persisters belong to the persistence
//! engine. The audit subsystem only needs the narrow views defined here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a persistence session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw session number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw session number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The session an event was raised in.
pub trait Session {
    /// Session identifier.
    fn id(&self) -> SessionId;

    /// Whether a transaction is currently active.
    fn is_transaction_in_progress(&self) -> bool;
}

/// A session whose transaction flag is driven explicitly.
///
/// Used by the CLI script runner and by tests.
#[derive(Debug, Clone)]
pub struct ManualSession {
    id: SessionId,
    in_transaction: bool,
}

impl ManualSession {
    /// Create a session with no active transaction.
    pub fn new(id: u64) -> Self {
        Self {
            id: SessionId::new(id),
            in_transaction: false,
        }
    }

    /// Start a transaction.
    pub fn begin(&mut self) {
        self.in_transaction = true;
    }

    /// End the current transaction.
    pub fn end(&mut self) {
        self.in_transaction = false;
    }
}

impl Session for ManualSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn is_transaction_in_progress(&self) -> bool {
        self.in_transaction
    }
}

/// What the audit listeners need to know about an entity's persister.
pub trait EntityPersister: Send + Sync {
    /// Entity name.
    fn entity_name(&self) -> &str;

    /// Property names, in state order.
    fn property_names(&self) -> &[String];

    /// Update-ability flags parallel to [`property_names`](Self::property_names).
    fn property_updateability(&self) -> &[bool];

    /// Position of a property in the state arrays.
    fn property_index(&self, name: &str) -> Option<usize> {
        self.property_names().iter().position(|p| p == name)
    }
}

/// Plain persister description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPersisterDef {
    /// Entity name.
    pub entity_name: String,
    /// Property names in state order.
    pub property_names: Vec<String>,
    /// Update-ability flags.
    pub updateability: Vec<bool>,
}

impl EntityPersisterDef {
    /// Create a persister with no properties.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            property_names: Vec::new(),
            updateability: Vec::new(),
        }
    }

    /// Append an updatable property.
    pub fn with_property(self, name: impl Into<String>) -> Self {
        self.with_property_updatable(name, true)
    }

    /// Append a property with explicit update-ability.
    pub fn with_property_updatable(mut self, name: impl Into<String>, updatable: bool) -> Self {
        self.property_names.push(name.into());
        self.updateability.push(updatable);
        self
    }
}

impl EntityPersister for EntityPersisterDef {
    fn entity_name(&self) -> &str {
        &self.entity_name
    }

    fn property_names(&self) -> &[String] {
        &self.property_names
    }

    fn property_updateability(&self) -> &[bool] {
        &self.updateability
    }
}
