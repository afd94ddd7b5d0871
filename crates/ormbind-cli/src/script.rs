//! Audit script replay.
//!
//! A script declares persisters and an ordered list of session steps. Steps run against
//! an audit pipeline writing into a memory sink; the rows left in the sink are the result.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use ormbind_audit::{
    AuditConfig, AuditEventListener, AuditProcessManager, AuditRecord, EntityPersister,
    EntityPersisterDef, ManualSession, MemoryAuditSink, PostDeleteEvent, PostInsertEvent,
    PostUpdateEvent, ProcessOutcome, Session,
};
use ormbind_core::binding::{BinderConfig, EntityBinder};
use ormbind_core::{EntityId, MappingDocument, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CliError, Result};

/// One persisted property of a scripted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Property name.
    pub name: String,
    /// Whether updates write this property; defaults to `true`.
    #[serde(default = "default_true")]
    pub updatable: bool,
}

fn default_true() -> bool {
    true
}

/// Persister layout of a scripted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersisterSpec {
    /// Entity name.
    pub name: String,
    /// Properties in state order.
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

impl PersisterSpec {
    fn to_persister(&self) -> EntityPersisterDef {
        self.properties
            .iter()
            .fold(EntityPersisterDef::new(&self.name), |def, p| {
                def.with_property_updatable(&p.name, p.updatable)
            })
    }
}

/// A session step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Start a transaction on `session`.
    Begin {
        /// Session id.
        session: u64,
    },
    /// Raise a post-insert event.
    Insert {
        /// Session id.
        session: u64,
        /// Entity name, as declared in `entities`.
        entity: String,
        /// Inserted instance.
        id: EntityId,
        /// Inserted state, in property order.
        state: Vec<Value>,
    },
    /// Raise a post-update event.
    Update {
        /// Session id.
        session: u64,
        /// Entity name, as declared in `entities`.
        entity: String,
        /// Updated instance.
        id: EntityId,
        /// State after the update.
        state: Vec<Value>,
        /// Database state before the update.
        #[serde(default)]
        old_state: Option<Vec<Value>>,
    },
    /// Raise a post-delete event.
    Delete {
        /// Session id.
        session: u64,
        /// Entity name, as declared in `entities`.
        entity: String,
        /// Deleted instance.
        id: EntityId,
        /// State at deletion.
        state: Vec<Value>,
    },
    /// Write pending audit work without ending the transaction.
    Flush {
        /// Session id.
        session: u64,
    },
    /// Write pending audit work and end the transaction.
    Commit {
        /// Session id.
        session: u64,
    },
    /// Discard pending audit work and end the transaction.
    Rollback {
        /// Session id.
        session: u64,
    },
}

/// A parsed audit script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditScript {
    /// Explicit audit configuration.
    pub config: Option<AuditConfig>,
    /// Mapping document the configuration is derived from when `config` is absent.
    pub mapping: Option<MappingDocument>,
    /// Persister layouts of the entities the steps touch.
    pub entities: Vec<PersisterSpec>,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

/// What a replay produced.
#[derive(Debug, Default)]
pub struct Replay {
    /// Rows remaining in the sink, in write order.
    pub records: Vec<AuditRecord>,
    /// Outcome of every commit step.
    pub commits: Vec<ProcessOutcome>,
}

impl AuditScript {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a script file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn audit_config(&self) -> Result<AuditConfig> {
        if let Some(config) = &self.config {
            return Ok(config.clone());
        }
        let Some(document) = &self.mapping else {
            warn!("script has neither config nor mapping; nothing is audited");
            return Ok(AuditConfig::default());
        };
        let binding = document.bind(&EntityBinder::new(BinderConfig::new()));
        if !binding.is_success() {
            return Err(CliError::Binding {
                entities: binding.failures.len(),
                errors: binding.error_count(),
            });
        }
        Ok(AuditConfig::from_bindings(&binding.bindings))
    }

    /// Run every step in order.
    pub fn replay(&self) -> Result<Replay> {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = Arc::new(AuditProcessManager::new(Arc::new(self.audit_config()?)).with_sink(sink.clone()));
        let listener = AuditEventListener::new(manager.clone());

        let persisters: HashMap<&str, Arc<dyn EntityPersister>> = self
            .entities
            .iter()
            .map(|spec| (spec.name.as_str(), Arc::new(spec.to_persister()) as Arc<dyn EntityPersister>))
            .collect();
        let mut sessions: BTreeMap<u64, ManualSession> = BTreeMap::new();
        let mut replay = Replay::default();

        for (index, step) in self.steps.iter().enumerate() {
            let step_no = index + 1;
            debug!(step = step_no, ?step, "replaying step");
            let persister = |entity: &str| {
                persisters.get(entity).cloned().ok_or_else(|| CliError::InvalidStep {
                    step: step_no,
                    message: format!("unknown entity {}", entity),
                })
            };

            match step {
                Step::Begin { session } => {
                    sessions
                        .entry(*session)
                        .or_insert_with(|| ManualSession::new(*session))
                        .begin();
                }
                Step::Insert {
                    session,
                    entity,
                    id,
                    state,
                } => {
                    let event = PostInsertEvent::new(persister(entity)?, id.clone(), state.clone());
                    listener.on_post_insert(session_of(&mut sessions, *session), &event)?;
                }
                Step::Update {
                    session,
                    entity,
                    id,
                    state,
                    old_state,
                } => {
                    let event =
                        PostUpdateEvent::new(persister(entity)?, id.clone(), state.clone(), old_state.clone());
                    listener.on_post_update(session_of(&mut sessions, *session), &event)?;
                }
                Step::Delete {
                    session,
                    entity,
                    id,
                    state,
                } => {
                    let event = PostDeleteEvent::new(persister(entity)?, id.clone(), state.clone());
                    listener.on_post_delete(session_of(&mut sessions, *session), &event)?;
                }
                Step::Flush { session } => {
                    let id = session_of(&mut sessions, *session).id();
                    manager.flush(id)?;
                }
                Step::Commit { session } => {
                    let session = session_of(&mut sessions, *session);
                    replay.commits.push(manager.commit(session.id())?);
                    session.end();
                }
                Step::Rollback { session } => {
                    let session = session_of(&mut sessions, *session);
                    manager.rollback(session.id());
                    session.end();
                }
            }
        }

        for session in sessions.values().filter(|s| s.is_transaction_in_progress()) {
            warn!(session = %session.id(), "transaction left open; pending audit work discarded");
            manager.rollback(session.id());
        }

        replay.records = sink.records();
        Ok(replay)
    }
}

fn session_of(sessions: &mut BTreeMap<u64, ManualSession>, id: u64) -> &mut ManualSession {
    sessions.entry(id).or_insert_with(|| ManualSession::new(id))
}
