use followme_map::ReconcileReport;
use ringbuffer::{AllocRingBuffer, RingBuffer};

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Reconciled(ReconcileReport),
    /// transport, status or decode error. the tick was skipped
    FetchFailed(String),
    /// the snapshot didn't match the map's symbol table
    Rejected(String),
    /// an older tick completed after a newer one was already reconciled
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub tick: u64,
    pub outcome: TickOutcome,
}

/// The outcomes of the most recent ticks, in the order they completed.
pub struct TickHistory {
    records: AllocRingBuffer<TickRecord>,
}

impl TickHistory {
    pub const CAPACITY: usize = 128;

    pub fn new() -> Self {
        Self {
            records: AllocRingBuffer::new(Self::CAPACITY),
        }
    }
    pub fn push(&mut self, tick: u64, outcome: TickOutcome) {
        self.records.push(TickRecord { tick, outcome });
    }
    pub fn iter(&self) -> impl Iterator<Item = &TickRecord> {
        self.records.iter()
    }
    pub fn last(&self) -> Option<&TickRecord> {
        self.records.iter().last()
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TickOutcome::FetchFailed(_)))
            .count()
    }
}

impl Default for TickHistory {
    fn default() -> Self {
        Self::new()
    }
}
