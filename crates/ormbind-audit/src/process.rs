//! Per-session audit process.
//!
//! Work units are queued in arrival order, at most one per entity instance. Performing
//! the queue writes one row per unit; units merged away after they were performed are
//! undone the next time the queue is performed.

use std::collections::{HashMap, VecDeque};

use ormbind_core::EntityId;
use tracing::{debug, trace};

use crate::config::AuditConfig;
use crate::error::Result;
use crate::record::AuditRecord;
use crate::revision::{Revision, RevisionGenerator};
use crate::session::SessionId;
use crate::sink::AuditSink;
use crate::work_unit::{AuditWorkUnit, MergeOutcome};

type UnitKey = (String, EntityId);

#[derive(Debug)]
struct TrackedUnit {
    unit: AuditWorkUnit,
    written: Option<AuditRecord>,
}

/// Summary of performing a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessOutcome {
    /// Revision the rows were written under, if any row was written.
    pub revision: Option<u64>,
    /// Rows written.
    pub written: usize,
    /// Rows undone.
    pub undone: usize,
}

/// Pending audit work of one session.
#[derive(Debug)]
pub struct AuditProcess {
    session: SessionId,
    units: HashMap<UnitKey, TrackedUnit>,
    queue: VecDeque<UnitKey>,
    undo_queue: Vec<AuditRecord>,
    revision: Option<Revision>,
}

impl AuditProcess {
    /// Create an empty process for `session`.
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            units: HashMap::new(),
            queue: VecDeque::new(),
            undo_queue: Vec::new(),
            revision: None,
        }
    }

    /// Owning session.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Revision of this process, generated on first use.
    pub fn current_revision(&mut self, generator: &dyn RevisionGenerator) -> Revision {
        *self.revision.get_or_insert_with(|| generator.next_revision())
    }

    /// Queue a work unit, merging it with a pending unit for the same instance.
    ///
    /// Units without work are ignored.
    pub fn add_work_unit(&mut self, unit: AuditWorkUnit) {
        if !unit.contains_work() {
            trace!(entity = unit.entity_name(), id = %unit.id(), "work unit without changes ignored");
            return;
        }

        let key: UnitKey = (unit.entity_name().to_string(), unit.id().clone());
        let Some(mut existing) = self.units.remove(&key) else {
            self.enqueue(key, unit);
            return;
        };

        let first_kind = existing.unit.kind();
        let second_kind = unit.kind();
        match existing.unit.merge(unit) {
            MergeOutcome::Kept => {
                self.units.insert(key, existing);
            }
            MergeOutcome::Replaced(merged) => {
                self.retire(&key, existing);
                self.enqueue(key, merged);
            }
            MergeOutcome::Dropped => {
                self.retire(&key, existing);
            }
        }
        trace!(first = %first_kind, second = %second_kind, "work units merged");
    }

    fn enqueue(&mut self, key: UnitKey, unit: AuditWorkUnit) {
        self.queue.push_back(key.clone());
        self.units.insert(key, TrackedUnit { unit, written: None });
    }

    fn retire(&mut self, key: &UnitKey, tracked: TrackedUnit) {
        self.queue.retain(|queued| queued != key);
        if let Some(record) = tracked.written {
            self.undo_queue.push(record);
        }
    }

    /// Number of units not yet performed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether there is nothing to perform or undo.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.undo_queue.is_empty()
    }

    /// Unit currently tracked for an instance.
    pub fn unit(&self, entity_name: &str, id: &EntityId) -> Option<&AuditWorkUnit> {
        self.units
            .get(&(entity_name.to_string(), id.clone()))
            .map(|tracked| &tracked.unit)
    }

    /// Units waiting to be performed, in queue order.
    pub fn queued_units(&self) -> impl Iterator<Item = &AuditWorkUnit> {
        self.queue
            .iter()
            .filter_map(|key| self.units.get(key))
            .map(|tracked| &tracked.unit)
    }

    /// Perform every queued unit and undo retired rows.
    ///
    /// Can run several times per transaction; performed units stay tracked so later
    /// units for the same instance still merge with them.
    pub fn perform(
        &mut self,
        config: &AuditConfig,
        generator: &dyn RevisionGenerator,
        sink: &dyn AuditSink,
    ) -> Result<ProcessOutcome> {
        let mut outcome = ProcessOutcome::default();
        if self.is_empty() {
            return Ok(outcome);
        }

        // A unit leaves its queue only once the sink accepted it, so a failed
        // perform can be retried without losing rows.
        let revision = self.current_revision(generator);
        while let Some(key) = self.queue.front() {
            if let Some(tracked) = self.units.get_mut(key) {
                let record = tracked.unit.to_record(config, &revision);
                sink.write(&record)?;
                tracked.written = Some(record);
                outcome.written += 1;
            }
            self.queue.pop_front();
        }

        while let Some(record) = self.undo_queue.first() {
            sink.undo(record)?;
            self.undo_queue.remove(0);
            outcome.undone += 1;
        }

        outcome.revision = Some(revision.number);
        debug!(
            session = %self.session,
            revision = revision.number,
            written = outcome.written,
            undone = outcome.undone,
            "audit queue performed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditedEntity;
    use crate::revision::SequenceRevisionGenerator;
    use crate::session::EntityPersisterDef;
    use crate::sink::MemoryAuditSink;
    use crate::work_unit::WorkUnitKind;
    use ormbind_core::Value;

    const SESSION: SessionId = SessionId::new(9);

    fn config() -> AuditConfig {
        AuditConfig::new().with_entity("Order", AuditedEntity::new())
    }

    fn persister() -> EntityPersisterDef {
        EntityPersisterDef::new("Order").with_property("status")
    }

    fn add(id: i64, status: &str) -> AuditWorkUnit {
        AuditWorkUnit::add(SESSION, &config(), &persister(), EntityId::Int(id), &[Value::from(status)]).unwrap()
    }

    fn modification(id: i64, new: &str, old: &str) -> AuditWorkUnit {
        AuditWorkUnit::modification(
            SESSION,
            &config(),
            &persister(),
            EntityId::Int(id),
            &[Value::from(new)],
            Some(&[Value::from(old)][..]),
        )
        .unwrap()
    }

    fn deletion(id: i64, status: &str) -> AuditWorkUnit {
        AuditWorkUnit::deletion(SESSION, &config(), &persister(), EntityId::Int(id), &[Value::from(status)]).unwrap()
    }

    #[test]
    fn test_units_without_work_are_ignored() {
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(modification(1, "NEW", "NEW"));
        assert!(process.is_empty());
    }

    #[test]
    fn test_one_unit_per_instance() {
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(add(1, "NEW"));
        process.add_work_unit(add(2, "NEW"));
        process.add_work_unit(modification(1, "PAID", "NEW"));

        assert_eq!(process.pending(), 2);
        let unit = process.unit("Order", &EntityId::Int(1)).unwrap();
        assert_eq!(unit.kind(), WorkUnitKind::Add);
        assert_eq!(unit.data()["status"], Value::from("PAID"));

        let order: Vec<_> = process.queued_units().map(|u| u.id().clone()).collect();
        assert_eq!(order, vec![EntityId::Int(2), EntityId::Int(1)]);
    }

    #[test]
    fn test_add_then_delete_cancels() {
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(add(1, "NEW"));
        process.add_work_unit(deletion(1, "NEW"));
        assert!(process.is_empty());
        assert!(process.unit("Order", &EntityId::Int(1)).is_none());
    }

    #[test]
    fn test_perform_writes_one_revision() {
        let generator = SequenceRevisionGenerator::new();
        let sink = MemoryAuditSink::new();
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(add(1, "NEW"));
        process.add_work_unit(add(2, "NEW"));

        let outcome = process.perform(&config(), &generator, &sink).unwrap();
        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.revision, Some(1));
        assert_eq!(sink.revisions(), vec![1]);
        assert_eq!(process.pending(), 0);
    }

    #[test]
    fn test_replaced_performed_unit_is_undone() {
        let generator = SequenceRevisionGenerator::new();
        let sink = MemoryAuditSink::new();
        let mut process = AuditProcess::new(SESSION);

        process.add_work_unit(add(1, "NEW"));
        process.perform(&config(), &generator, &sink).unwrap();
        assert_eq!(sink.len(), 1);

        process.add_work_unit(modification(1, "PAID", "NEW"));
        let outcome = process.perform(&config(), &generator, &sink).unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.undone, 1);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("status"), Some(&Value::from("PAID")));
        assert_eq!(outcome.revision, Some(1));
    }

    /// Sink refusing its first `failures` writes.
    struct FailingSink {
        inner: MemoryAuditSink,
        failures: parking_lot::Mutex<usize>,
    }

    impl FailingSink {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemoryAuditSink::new(),
                failures: parking_lot::Mutex::new(failures),
            }
        }
    }

    impl AuditSink for FailingSink {
        fn write(&self, record: &AuditRecord) -> Result<()> {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(crate::error::AuditError::Sink("disk full".to_string()));
            }
            self.inner.write(record)
        }

        fn undo(&self, record: &AuditRecord) -> Result<()> {
            self.inner.undo(record)
        }
    }

    #[test]
    fn test_failed_write_keeps_unit_queued() {
        let generator = SequenceRevisionGenerator::new();
        let sink = FailingSink::new(1);
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(add(1, "NEW"));
        process.add_work_unit(add(2, "NEW"));

        assert!(process.perform(&config(), &generator, &sink).is_err());
        assert_eq!(process.pending(), 2);
        assert!(sink.inner.is_empty());

        let outcome = process.perform(&config(), &generator, &sink).unwrap();
        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.revision, Some(1));
        assert_eq!(sink.inner.len(), 2);
        assert_eq!(process.pending(), 0);
    }

    #[test]
    fn test_failure_mid_queue_does_not_rewrite_earlier_rows() {
        let generator = SequenceRevisionGenerator::new();
        let sink = FailingSink::new(0);
        let mut process = AuditProcess::new(SESSION);
        process.add_work_unit(add(1, "NEW"));
        process.perform(&config(), &generator, &sink).unwrap();

        process.add_work_unit(add(2, "NEW"));
        *sink.failures.lock() = 1;
        assert!(process.perform(&config(), &generator, &sink).is_err());
        assert_eq!(process.pending(), 1);

        let outcome = process.perform(&config(), &generator, &sink).unwrap();
        assert_eq!(outcome.written, 1);
        assert_eq!(sink.inner.len(), 2);
    }

    #[test]
    fn test_empty_process_does_not_generate_revision() {
        let generator = SequenceRevisionGenerator::new();
        let mut process = AuditProcess::new(SESSION);
        let outcome = process.perform(&config(), &generator, &MemoryAuditSink::new()).unwrap();
        assert_eq!(outcome, ProcessOutcome::default());
        assert_eq!(generator.peek(), 1);
    }
}
