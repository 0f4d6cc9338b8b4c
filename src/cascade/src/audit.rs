//! Audit event vocabulary for cascade runs.

use anyhow::Result;

/// A single removal-trail event, in the order the engine produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// An entry was popped from the worklist for processing.
    Processing { entry: String },
    /// Rows matching the entry's identifier were dropped from a sheet.
    DirectRemoval {
        entry: String,
        node: String,
        id_column: String,
    },
    /// A dependent child was found through a link column and queued.
    ChildDiscovered {
        child: String,
        node: String,
        link_column: String,
    },
}

/// Receives the chronological audit trail of a cascade run.
///
/// The engine emits every event through this seam: the production sink
/// appends to the run's log file, tests collect events in memory. Sink
/// failures abort the run.
pub trait AuditSink {
    /// Called once, before processing, with the full initial removal request.
    fn begin(&mut self, request: &[String]) -> Result<()>;

    /// Called for every event, in emission order.
    fn record(&mut self, event: &AuditEvent) -> Result<()>;

    /// Called once after the worklist drains, with the per-node-kind removal
    /// lists in working-set order.
    fn summary(&mut self, deletions: &[(String, Vec<String>)]) -> Result<()>;
}

/// In-memory sink for tests and dry inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub request: Vec<String>,
    pub events: Vec<AuditEvent>,
    pub deletions: Vec<(String, Vec<String>)>,
}

impl AuditSink for MemorySink {
    fn begin(&mut self, request: &[String]) -> Result<()> {
        self.request = request.to_vec();
        Ok(())
    }

    fn record(&mut self, event: &AuditEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn summary(&mut self, deletions: &[(String, Vec<String>)]) -> Result<()> {
        self.deletions = deletions.to_vec();
        Ok(())
    }
}
