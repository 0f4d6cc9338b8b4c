//! Working set of node tables loaded from a manifest directory.
//!
//! Tables keep their raw cells and are mutated in place by the engine;
//! load order is the fixed iteration order for the whole run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::NodeSchema;
use crate::workbook::{self, Sheet, WorkbookError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no usable node sheets found in manifest {}", path.display())]
    NoUsableSheets { path: PathBuf },
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

/// One node kind's sheet plus its resolved schema.
#[derive(Debug, Clone)]
pub struct NodeTable {
    pub sheet: Sheet,
    pub schema: NodeSchema,
}

/// The mutable working set of a run, in load order.
#[derive(Debug)]
pub struct SheetStore {
    tables: Vec<NodeTable>,
}

impl SheetStore {
    /// Load every node kind's sheet from the manifest directory.
    ///
    /// A node kind without a sheet file is skipped; a sheet that fails the
    /// usability check is dropped from the working set. Both are silent.
    /// An empty working set after all loads is fatal.
    pub fn load(manifest_dir: &Path, node_kinds: &[String]) -> Result<Self, StoreError> {
        let mut tables = Vec::new();
        for node in node_kinds {
            let Some(path) = workbook::sheet_path(manifest_dir, node) else {
                debug!(node = %node, "no sheet file for node kind, skipping");
                continue;
            };
            let sheet = Sheet::load(&path)?;
            if !sheet.is_usable() {
                debug!(node = %node, "sheet not usable, dropped from working set");
                continue;
            }
            let schema = NodeSchema::resolve(node, &sheet.columns);
            if schema.id_column.is_none() {
                warn!(
                    node = %node,
                    "sheet has no identifier column; it can yield neither removals nor children"
                );
            }
            tables.push(NodeTable { sheet, schema });
        }

        if tables.is_empty() {
            return Err(StoreError::NoUsableSheets {
                path: manifest_dir.to_path_buf(),
            });
        }
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[NodeTable] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [NodeTable] {
        &mut self.tables
    }

    pub fn get(&self, node: &str) -> Option<&NodeTable> {
        self.tables.iter().find(|t| t.schema.node == node)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn from_tables(tables: Vec<NodeTable>) -> Self {
        Self { tables }
    }
}
