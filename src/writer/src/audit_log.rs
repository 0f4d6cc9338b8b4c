//! File-backed audit trail.
//!
//! Appends one line per engine event, in emission order, to a plain text
//! log. The file stays open for the duration of the run and must be closed
//! through [`AuditLog::finish`] before the run reports success.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cascade::audit::{AuditEvent, AuditSink};

pub struct AuditLog {
    path: PathBuf,
    file: BufWriter<File>,
}

impl AuditLog {
    /// Create the log file, truncating any leftover from a previous run.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create audit log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the log, returning its path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.file
            .flush()
            .with_context(|| format!("failed to flush audit log {}", self.path.display()))?;
        Ok(self.path)
    }
}

impl AuditSink for AuditLog {
    fn begin(&mut self, request: &[String]) -> Result<()> {
        writeln!(self.file, "Entries to remove (and discovered children):")?;
        for entry in request {
            writeln!(self.file, "{entry}")?;
        }
        writeln!(self.file)?;
        Ok(())
    }

    fn record(&mut self, event: &AuditEvent) -> Result<()> {
        match event {
            AuditEvent::Processing { entry } => {
                writeln!(self.file, "Removing: {entry}")?;
            }
            AuditEvent::DirectRemoval {
                entry,
                node,
                id_column,
            } => {
                writeln!(self.file, "  - {entry} dropped from {node}.{id_column}")?;
            }
            AuditEvent::ChildDiscovered {
                child,
                node,
                link_column,
            } => {
                writeln!(
                    self.file,
                    "    => discovered child {child} in {node}.{link_column}"
                )?;
            }
        }
        Ok(())
    }

    fn summary(&mut self, deletions: &[(String, Vec<String>)]) -> Result<()> {
        writeln!(self.file)?;
        writeln!(self.file, "Summary of deletions by sheet:")?;
        for (node, items) in deletions {
            writeln!(self.file, " {node}: [{}]", items.join(", "))?;
        }
        Ok(())
    }
}
