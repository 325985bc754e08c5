//! Application state owned by the orchestrator: the loaded list plus a load
//! generation so a slow, superseded load can never overwrite a newer one.

use tracing::{info, warn};

use crate::loader::LoadError;

/// Handed out by [`Board::begin_load`]; only the newest ticket may complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: String,
}

impl LoadTicket {
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading { source: String },
    Ready { source: String },
    Failed { source: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct Board<T> {
    records: Vec<T>,
    generation: u64,
    phase: Phase,
}

impl<T> Default for Board<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            generation: 0,
            phase: Phase::Idle,
        }
    }
}

impl<T> Board<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Starts a new load. Any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self, source: impl Into<String>) -> LoadTicket {
        self.generation += 1;
        let source = source.into();
        self.phase = Phase::Loading { source: source.clone() };
        LoadTicket {
            generation: self.generation,
            source,
        }
    }

    /// Applies a finished load. Success replaces the list wholesale; failure
    /// clears it so no list from an earlier source lingers under the new label.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<Vec<T>, LoadError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            info!(
                "Discarding stale load of {} (generation {}, current {})",
                ticket.source, ticket.generation, self.generation
            );
            return LoadOutcome::Stale;
        }

        match outcome {
            Ok(records) => {
                self.records = records;
                self.phase = Phase::Ready { source: ticket.source };
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("Load of {} failed: {}", ticket.source, e);
                self.records.clear();
                self.phase = Phase::Failed {
                    source: ticket.source,
                    reason: e.to_string(),
                };
                LoadOutcome::Failed
            }
        }
    }

    pub fn status(&self, shown: usize) -> Status {
        match &self.phase {
            Phase::Idle => Status::Idle,
            Phase::Loading { source } => Status::Loading { source: source.clone() },
            Phase::Failed { source, reason } => Status::Failed {
                source: source.clone(),
                reason: reason.clone(),
            },
            Phase::Ready { .. } if self.records.is_empty() => Status::Empty,
            Phase::Ready { .. } if shown == 0 => Status::NoMatches,
            Phase::Ready { .. } => Status::Showing {
                shown,
                total: self.records.len(),
            },
        }
    }
}

/// What the status line reports for one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been requested yet.
    Idle,
    Loading { source: String },
    /// The load succeeded but contained no usable records.
    Empty,
    /// Records exist but the filters matched none of them.
    NoMatches,
    Showing { shown: usize, total: usize },
    Failed { source: String, reason: String },
}
