//! Cascading-deletion engine.
//!
//! Pops entries off a FIFO worklist, drops matching rows from every sheet in
//! the working set, and follows link columns to queue dependent child
//! entries, until the worklist drains. Breadth-first by construction: children
//! are appended to the back, entries are popped from the front.
//!
//! ## Termination
//!
//! Every enqueue of a discovered child is guarded by a visited set keyed by
//! `(node kind, entry)`. Each pair can be enqueued at most once and the node
//! set is fixed for the run, so the worklist drains on any input, cyclic
//! reference data included.

pub mod audit;

pub use audit::{AuditEvent, AuditSink, MemorySink};

use std::collections::{HashSet, VecDeque};

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::store::SheetStore;
use tracing::{debug, info};

/// Result of one cascade run.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Entries removed per node kind, in removal order; node kinds in
    /// working-set order, empty lists included.
    pub deletions: Vec<(String, Vec<String>)>,
    pub entries_processed: usize,
    pub children_discovered: usize,
}

impl CascadeOutcome {
    pub fn removed(&self, node: &str) -> &[String] {
        self.deletions
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, items)| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_removed(&self) -> usize {
        self.deletions.iter().map(|(_, items)| items.len()).sum()
    }
}

/// The worklist algorithm over one mutable working set.
pub struct CascadeEngine<'a> {
    store: &'a mut SheetStore,
}

impl<'a> CascadeEngine<'a> {
    pub fn new(store: &'a mut SheetStore) -> Self {
        Self { store }
    }

    /// Run to worklist exhaustion.
    ///
    /// The worklist is seeded from `request` with blanks and duplicates
    /// dropped, order preserved. Every audit event goes through `sink` in
    /// strict chronological order; a sink failure aborts the run.
    pub fn run(self, request: &[String], sink: &mut dyn AuditSink) -> Result<CascadeOutcome> {
        let started_at = Utc::now();
        let run_id = format!("cascade_{}", started_at.timestamp_millis());

        let mut worklist: VecDeque<String> = VecDeque::new();
        let mut pending: HashSet<String> = HashSet::new();
        for entry in request {
            let entry = entry.trim();
            if entry.is_empty() || !pending.insert(entry.to_string()) {
                continue;
            }
            worklist.push_back(entry.to_string());
        }

        let initial: Vec<String> = worklist.iter().cloned().collect();
        sink.begin(&initial)?;

        let node_count = self.store.len();
        let mut removed: Vec<Vec<String>> = vec![Vec::new(); node_count];
        let mut visited: HashSet<(String, String)> = HashSet::new();
        let mut entries_processed = 0usize;
        let mut children_discovered = 0usize;

        while let Some(curr) = worklist.pop_front() {
            pending.remove(&curr);
            entries_processed += 1;
            sink.record(&AuditEvent::Processing {
                entry: curr.clone(),
            })?;

            for (idx, table) in self.store.tables_mut().iter_mut().enumerate() {
                // A sheet without its identifier column can neither yield
                // direct removals nor name discovered children.
                let Some(id_col) = table.schema.id_column else {
                    continue;
                };

                let before = table.sheet.rows.len();
                table.sheet.rows.retain(|row| row[id_col] != curr);
                if table.sheet.rows.len() < before {
                    debug!(
                        entry = %curr,
                        node = %table.schema.node,
                        rows = before - table.sheet.rows.len(),
                        "direct removal"
                    );
                    removed[idx].push(curr.clone());
                    sink.record(&AuditEvent::DirectRemoval {
                        entry: curr.clone(),
                        node: table.schema.node.clone(),
                        id_column: table.sheet.columns[id_col].clone(),
                    })?;
                }

                // Link scan over the surviving rows: rows dropped above are
                // gone, rows removed from other sheets are not this sheet's
                // concern.
                for &link_col in &table.schema.link_columns {
                    for row in &table.sheet.rows {
                        if row[link_col] != curr {
                            continue;
                        }
                        let child = row[id_col].trim();
                        if child.is_empty() {
                            continue;
                        }
                        if removed[idx].iter().any(|r| r == child) {
                            continue;
                        }
                        if pending.contains(child) {
                            continue;
                        }
                        let key = (table.schema.node.clone(), child.to_string());
                        if !visited.insert(key) {
                            continue;
                        }
                        worklist.push_back(child.to_string());
                        pending.insert(child.to_string());
                        children_discovered += 1;
                        sink.record(&AuditEvent::ChildDiscovered {
                            child: child.to_string(),
                            node: table.schema.node.clone(),
                            link_column: table.sheet.columns[link_col].clone(),
                        })?;
                    }
                }
            }
        }

        let deletions: Vec<(String, Vec<String>)> = self
            .store
            .tables()
            .iter()
            .map(|t| t.schema.node.clone())
            .zip(removed)
            .collect();
        sink.summary(&deletions)?;

        let completed_at = Utc::now();
        info!(
            run_id = %run_id,
            entries_processed,
            children_discovered,
            removed = deletions.iter().map(|(_, items)| items.len()).sum::<usize>(),
            "cascade run completed"
        );

        Ok(CascadeOutcome {
            run_id,
            started_at,
            completed_at,
            deletions,
            entries_processed,
            children_discovered,
        })
    }
}
