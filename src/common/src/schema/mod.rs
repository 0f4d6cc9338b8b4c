//! Template parsing and column classification.
//!
//! The template (the original workbook's "Dictionary" sheet) enumerates the
//! node kinds a manifest may carry. Column classification turns a sheet
//! header into a typed [`NodeSchema`] once, up front; the engine never
//! pattern-matches column names during a run.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::workbook::SheetFormat;

/// Header of the template column enumerating node-kind names.
pub const NODE_COLUMN: &str = "Node";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("template {} has no {NODE_COLUMN} column", path.display())]
    MissingNodeColumn { path: PathBuf },
    #[error("template {} declares no node kinds", path.display())]
    Empty { path: PathBuf },
}

/// Read the ordered list of unique node-kind names from a template file.
///
/// Blank rows are discarded and duplicates keep their first position. Any
/// structural problem is fatal: there is no partial schema.
pub fn load_node_kinds(path: &Path) -> Result<Vec<String>, SchemaError> {
    let format = SheetFormat::from_path(path);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .flexible(true)
        .from_path(path)
        .map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader.headers().map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let node_idx = headers
        .iter()
        .position(|h| h == NODE_COLUMN)
        .ok_or_else(|| SchemaError::MissingNodeColumn {
            path: path.to_path_buf(),
        })?;

    let mut nodes: Vec<String> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let node = record.get(node_idx).unwrap_or("").trim();
        if node.is_empty() {
            continue;
        }
        if !nodes.iter().any(|n| n == node) {
            nodes.push(node.to_string());
        }
    }

    if nodes.is_empty() {
        return Err(SchemaError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(nodes)
}

/// How one sheet column participates in cascade removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// `"<node>_id"` — holds the entries this sheet owns.
    Identifier,
    /// Contains a `.` and ends in `_id` — references a parent entry.
    Link,
    /// Anything else.
    Attribute,
}

/// Classify a column name for the given node kind. Pure and total; no
/// column is ever double-classified.
pub fn classify_column(node: &str, column: &str) -> ColumnRole {
    if column == format!("{node}_id") {
        ColumnRole::Identifier
    } else if column.contains('.') && column.ends_with("_id") {
        ColumnRole::Link
    } else {
        ColumnRole::Attribute
    }
}

/// Typed description of how one node kind's sheet wires into the reference
/// graph. Resolved once per loaded sheet and then passed around by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSchema {
    pub node: String,
    /// Index of the `"<node>_id"` column, when the sheet has one.
    pub id_column: Option<usize>,
    /// Indices of the parent-reference columns.
    pub link_columns: Vec<usize>,
}

impl NodeSchema {
    pub fn resolve(node: &str, columns: &[String]) -> Self {
        let mut id_column = None;
        let mut link_columns = Vec::new();
        for (idx, column) in columns.iter().enumerate() {
            match classify_column(node, column) {
                ColumnRole::Identifier => {
                    if id_column.is_none() {
                        id_column = Some(idx);
                    }
                }
                ColumnRole::Link => link_columns.push(idx),
                ColumnRole::Attribute => {}
            }
        }
        Self {
            node: node.to_string(),
            id_column,
            link_columns,
        }
    }
}
