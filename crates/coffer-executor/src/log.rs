//! Execution log.
//!
//! One entry per executed proposal, append-only. Each entry commits to the
//! previous entry's hash, so editing or dropping any entry breaks the chain
//! from that point on.

use coffer_types::{Address, Amount, Hash, LogId, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub log_id: LogId,
    pub proposal_id: ProposalId,
    pub destination: Address,
    pub executed_amount: Amount,
    pub timestamp: Timestamp,
    pub executed_by: Address,
    pub prev_hash: Hash,
    pub entry_hash: Hash,
}

impl LogEntry {
    fn compute_hash(&self) -> Hash {
        Hash::compute_multi(&[
            self.prev_hash.as_bytes(),
            &self.log_id.to_le_bytes(),
            &self.proposal_id.to_le_bytes(),
            self.destination.as_bytes(),
            &self.executed_amount.to_le_bytes(),
            &self.timestamp.to_le_bytes(),
            self.executed_by.as_bytes(),
        ])
    }

    /// Check the entry's own hash.
    pub fn verify(&self) -> bool {
        self.entry_hash == self.compute_hash()
    }
}

#[derive(Debug, Default)]
pub struct ExecutionLog {
    entries: Vec<LogEntry>,
    by_proposal: HashMap<ProposalId, LogId>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the entry for a completed payout.
    pub fn append(
        &mut self,
        proposal_id: ProposalId,
        destination: Address,
        executed_amount: Amount,
        timestamp: Timestamp,
        executed_by: Address,
    ) -> LogEntry {
        let mut entry = LogEntry {
            log_id: self.entries.len() as LogId + 1,
            proposal_id,
            destination,
            executed_amount,
            timestamp,
            executed_by,
            prev_hash: self.head_hash(),
            entry_hash: Hash::ZERO,
        };
        entry.entry_hash = entry.compute_hash();

        self.by_proposal.insert(proposal_id, entry.log_id);
        self.entries.push(entry.clone());
        entry
    }

    pub fn get(&self, log_id: LogId) -> Option<&LogEntry> {
        let index = usize::try_from(log_id).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }

    pub fn log_id_for(&self, proposal_id: ProposalId) -> Option<LogId> {
        self.by_proposal.get(&proposal_id).copied()
    }

    pub fn for_proposal(&self, proposal_id: ProposalId) -> Option<&LogEntry> {
        self.log_id_for(proposal_id).and_then(|id| self.get(id))
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry, or zero for an empty log.
    pub fn head_hash(&self) -> Hash {
        self.entries.last().map(|e| e.entry_hash).unwrap_or(Hash::ZERO)
    }

    /// Id of the first entry whose hash or link does not check out.
    pub fn first_broken_link(&self) -> Option<LogId> {
        let mut prev = Hash::ZERO;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.log_id != index as LogId + 1 || entry.prev_hash != prev || !entry.verify() {
                return Some(index as LogId + 1);
            }
            prev = entry.entry_hash;
        }
        None
    }

    pub fn verify_chain(&self) -> bool {
        self.first_broken_link().is_none()
    }

    /// Entries as newline-delimited JSON.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}
