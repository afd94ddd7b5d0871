//! ORMBIND Audit - entity change auditing.
//!
//! Post-event listeners turn entity lifecycle events into work units. Work units for the
//! same entity instance are merged inside the session's audit process, and the process
//! is performed as one revision of audit rows when the transaction commits.
//!
//! ```
//! use std::sync::Arc;
//!
//! use ormbind_audit::{
//!     AuditConfig, AuditEventListener, AuditProcessManager, AuditedEntity, EntityPersisterDef,
//!     ManualSession, MemoryAuditSink, PostInsertEvent,
//! };
//! use ormbind_core::{EntityId, Value};
//!
//! let sink = Arc::new(MemoryAuditSink::new());
//! let config = AuditConfig::new().with_entity("Order", AuditedEntity::new());
//! let manager = Arc::new(AuditProcessManager::new(Arc::new(config)).with_sink(sink.clone()));
//! let listener = AuditEventListener::new(manager.clone());
//!
//! let mut session = ManualSession::new(1);
//! session.begin();
//! let persister = Arc::new(EntityPersisterDef::new("Order").with_property("status"));
//! let event = PostInsertEvent::new(persister, EntityId::Int(1), vec![Value::from("NEW")]);
//! listener.on_post_insert(&session, &event).unwrap();
//!
//! manager.commit(ormbind_audit::SessionId::new(1)).unwrap();
//! assert_eq!(sink.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod manager;
pub mod process;
pub mod record;
pub mod revision;
pub mod session;
pub mod sink;
pub mod work_unit;

pub use config::{AuditConfig, AuditedEntity, RelationDescription, RelationKind};
pub use error::{AuditError, Result};
pub use event::{PostDeleteEvent, PostInsertEvent, PostUpdateEvent};
pub use listener::AuditEventListener;
pub use manager::AuditProcessManager;
pub use process::{AuditProcess, ProcessOutcome};
pub use record::{AuditRecord, RevisionType};
pub use revision::{Revision, RevisionGenerator, SequenceRevisionGenerator};
pub use session::{EntityPersister, EntityPersisterDef, ManualSession, Session, SessionId};
pub use sink::{AuditSink, MemoryAuditSink, NullAuditSink};
pub use work_unit::{AuditData, AuditWorkUnit, MergeOutcome, WorkUnitKind};
