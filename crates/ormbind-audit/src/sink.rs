//! Audit sinks.
//!
//! The persistence-write layer is external; a sink is where performed work units land.

use parking_lot::Mutex;

use crate::error::Result;
use crate::record::AuditRecord;

/// Destination for audit rows.
pub trait AuditSink: Send + Sync {
    /// Write a row.
    fn write(&self, record: &AuditRecord) -> Result<()>;

    /// Revert a row written earlier in the same transaction.
    fn undo(&self, record: &AuditRecord) -> Result<()>;
}

/// In-memory sink for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows currently held, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Rows of one entity instance.
    pub fn history(&self, entity_name: &str, id: &ormbind_core::EntityId) -> Vec<AuditRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.entity_name == entity_name && &r.entity_id == id)
            .cloned()
            .collect()
    }

    /// Distinct revision numbers, ascending.
    pub fn revisions(&self) -> Vec<u64> {
        let mut revisions: Vec<u64> = self.records.lock().iter().map(|r| r.revision).collect();
        revisions.sort_unstable();
        revisions.dedup();
        revisions
    }

    /// Remove every row.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn undo(&self, record: &AuditRecord) -> Result<()> {
        let mut records = self.records.lock();
        if let Some(position) = records.iter().rposition(|r| r == record) {
            records.remove(position);
        }
        Ok(())
    }
}

/// Sink that discards every row.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn write(&self, _record: &AuditRecord) -> Result<()> {
        Ok(())
    }

    fn undo(&self, _record: &AuditRecord) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RevisionType;
    use ormbind_core::EntityId;

    fn record(revision: u64, id: i64) -> AuditRecord {
        AuditRecord {
            revision,
            timestamp: 0,
            revision_type: RevisionType::Add,
            entity_name: "Order".to_string(),
            audit_entity_name: "Order_AUD".to_string(),
            entity_id: EntityId::Int(id),
            data: Vec::new(),
            modified: Vec::new(),
        }
    }

    #[test]
    fn test_memory_sink_write_and_undo() {
        let sink = MemoryAuditSink::new();
        sink.write(&record(1, 1)).unwrap();
        sink.write(&record(1, 2)).unwrap();
        sink.write(&record(2, 1)).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.revisions(), vec![1, 2]);
        assert_eq!(sink.history("Order", &EntityId::Int(1)).len(), 2);

        sink.undo(&record(1, 2)).unwrap();
        assert_eq!(sink.len(), 2);
        assert!(sink.history("Order", &EntityId::Int(2)).is_empty());

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullAuditSink;
        assert!(sink.write(&record(1, 1)).is_ok());
        assert!(sink.undo(&record(1, 1)).is_ok());
    }
}
