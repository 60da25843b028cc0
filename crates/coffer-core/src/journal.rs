//! Append-only audit journal.
//!
//! Every component emits its state transitions here. Records are stamped
//! with a sequence number and the clock time at emission, mirrored to
//! `tracing` under the `coffer::audit` target, and can be queried by
//! proposal, account or event kind.

use crate::clock::Clock;
use coffer_types::{Address, Event, EventKind, ProposalId, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A journaled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-indexed position in the journal
    pub seq: u64,
    pub timestamp: Timestamp,
    pub event: Event,
}

/// Shared audit stream.
#[derive(Debug)]
pub struct EventJournal {
    clock: Arc<dyn Clock>,
    records: RwLock<Vec<EventRecord>>,
}

impl EventJournal {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Append an event. Returns its sequence number.
    pub fn emit(&self, event: Event) -> u64 {
        let timestamp = self.clock.now();
        let mut records = self.records.write();
        let seq = records.len() as u64 + 1;

        tracing::info!(target: "coffer::audit", seq, kind = ?event.kind(), ?event, "event");

        records.push(EventRecord {
            seq,
            timestamp,
            event,
        });
        seq
    }

    /// Current clock time, as used for record timestamps.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    pub fn last(&self) -> Option<EventRecord> {
        self.records.read().last().cloned()
    }

    /// Records with a sequence number strictly greater than `seq`.
    pub fn since(&self, seq: u64) -> Vec<EventRecord> {
        self.filter(|r| r.seq > seq)
    }

    pub fn for_proposal(&self, proposal_id: ProposalId) -> Vec<EventRecord> {
        self.filter(|r| r.event.proposal_id() == Some(proposal_id))
    }

    pub fn for_account(&self, account: &Address) -> Vec<EventRecord> {
        self.filter(|r| r.event.involves(account))
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<EventRecord> {
        self.filter(|r| r.event.kind() == kind)
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.records.read().iter().filter(|r| r.event.kind() == kind).count()
    }

    /// Export as newline-delimited JSON.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let records = self.records.read();
        let mut out = String::new();
        for record in records.iter() {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    fn filter(&self, pred: impl Fn(&EventRecord) -> bool) -> Vec<EventRecord> {
        self.records.read().iter().filter(|r| pred(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn journal(clock: Arc<ManualClock>) -> EventJournal {
        EventJournal::new(clock)
    }

    #[test_log::test]
    fn test_emit_stamps_sequence_and_time() {
        let clock = Arc::new(ManualClock::new(1_000));
        let journal = journal(clock.clone());
        assert!(journal.is_empty());

        let account = Address::from_bytes([1u8; 20]);
        assert_eq!(journal.emit(Event::Deposited { account, amount: 5, new_balance: 5 }), 1);
        clock.advance(10);
        assert_eq!(journal.emit(Event::ProposalExecuted { proposal_id: 3 }), 2);

        let records = journal.records();
        assert_eq!(records[0].timestamp, 1_000);
        assert_eq!(records[1].timestamp, 1_010);
        assert_eq!(journal.last().unwrap().seq, 2);
    }

    #[test]
    fn test_queries() {
        let journal = journal(Arc::new(ManualClock::new(0)));
        let alice = Address::from_bytes([1u8; 20]);
        let bob = Address::from_bytes([2u8; 20]);

        journal.emit(Event::Deposited { account: alice, amount: 10, new_balance: 10 });
        journal.emit(Event::VoteCast { proposal_id: 1, voter: bob, option: 1 });
        journal.emit(Event::VoteCast { proposal_id: 2, voter: alice, option: 0 });

        assert_eq!(journal.for_account(&alice).len(), 2);
        assert_eq!(journal.for_proposal(1).len(), 1);
        assert_eq!(journal.of_kind(EventKind::VoteCast).len(), 2);
        assert_eq!(journal.count_of(EventKind::Deposited), 1);
        assert_eq!(journal.since(1).len(), 2);
    }

    #[test]
    fn test_json_lines_export() {
        let journal = journal(Arc::new(ManualClock::new(7)));
        journal.emit(Event::ExternalInflow { amount: 42 });
        journal.emit(Event::ProposalExecuted { proposal_id: 1 });

        let dump = journal.to_json_lines().unwrap();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: EventRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.event, Event::ExternalInflow { amount: 42 });
        assert_eq!(first.timestamp, 7);
    }
}
