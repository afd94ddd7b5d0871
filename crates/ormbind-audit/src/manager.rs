//! Registry of per-session audit processes.

use std::sync::Arc;

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tracing::{debug, info, instrument};

use crate::config::AuditConfig;
use crate::error::Result;
use crate::process::{AuditProcess, ProcessOutcome};
use crate::revision::{RevisionGenerator, SequenceRevisionGenerator};
use crate::session::SessionId;
use crate::sink::{AuditSink, NullAuditSink};

/// Owns the audit process of every session with pending audit work.
///
/// Each process is only touched by its owning session; the map itself is shared.
pub struct AuditProcessManager {
    config: Arc<AuditConfig>,
    processes: DashMap<SessionId, AuditProcess>,
    revisions: Arc<dyn RevisionGenerator>,
    sink: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for AuditProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditProcessManager")
            .field("processes", &self.processes.len())
            .finish_non_exhaustive()
    }
}

impl AuditProcessManager {
    /// Create a manager with a sequence revision generator and a discarding sink.
    pub fn new(config: Arc<AuditConfig>) -> Self {
        Self {
            config,
            processes: DashMap::new(),
            revisions: Arc::new(SequenceRevisionGenerator::new()),
            sink: Arc::new(NullAuditSink),
        }
    }

    /// Use a different revision generator.
    pub fn with_revision_generator(mut self, generator: Arc<dyn RevisionGenerator>) -> Self {
        self.revisions = generator;
        self
    }

    /// Use a different sink.
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Audit configuration.
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// The audit process of `session`, created on first use.
    pub fn get(&self, session: SessionId) -> RefMut<'_, SessionId, AuditProcess> {
        self.processes.entry(session).or_insert_with(|| {
            debug!(%session, "audit process created");
            AuditProcess::new(session)
        })
    }

    /// Whether `session` has an audit process.
    pub fn has_process(&self, session: SessionId) -> bool {
        self.processes.contains_key(&session)
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Perform the pending work of `session` without ending its process.
    pub fn flush(&self, session: SessionId) -> Result<ProcessOutcome> {
        match self.processes.get_mut(&session) {
            Some(mut process) => process.perform(&self.config, self.revisions.as_ref(), self.sink.as_ref()),
            None => Ok(ProcessOutcome::default()),
        }
    }

    /// Perform the pending work of `session` and drop its process.
    #[instrument(skip(self))]
    pub fn commit(&self, session: SessionId) -> Result<ProcessOutcome> {
        // The process is kept on failure so the commit can be retried.
        let outcome = match self.processes.get_mut(&session) {
            Some(mut process) => process.perform(&self.config, self.revisions.as_ref(), self.sink.as_ref())?,
            None => return Ok(ProcessOutcome::default()),
        };
        self.processes.remove(&session);
        info!(revision = ?outcome.revision, written = outcome.written, "audit transaction committed");
        Ok(outcome)
    }

    /// Discard the pending work of `session`. Returns whether a process existed.
    #[instrument(skip(self))]
    pub fn rollback(&self, session: SessionId) -> bool {
        let discarded = self.processes.remove(&session).is_some();
        if discarded {
            info!("audit transaction rolled back");
        }
        discarded
    }
}
