//! Revision numbering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One revision: every audit row written by a transaction shares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision number.
    pub number: u64,
    /// Creation time, microseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Produces revisions.
pub trait RevisionGenerator: Send + Sync {
    /// Generate the next revision.
    fn next_revision(&self) -> Revision;
}

/// Monotonic in-process revision counter.
#[derive(Debug)]
pub struct SequenceRevisionGenerator {
    next: AtomicU64,
}

impl Default for SequenceRevisionGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl SequenceRevisionGenerator {
    /// Start numbering at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Number the next revision will get.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl RevisionGenerator for SequenceRevisionGenerator {
    fn next_revision(&self) -> Revision {
        Revision {
            number: self.next.fetch_add(1, Ordering::SeqCst),
            timestamp: now_micros(),
        }
    }
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let generator = SequenceRevisionGenerator::starting_at(10);
        let first = generator.next_revision();
        let second = generator.next_revision();
        assert_eq!(first.number, 10);
        assert_eq!(second.number, 11);
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(generator.peek(), 12);
    }
}
