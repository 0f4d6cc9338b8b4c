//! Sheet model and delimited-file I/O.
//!
//! A manifest is a directory of sheet files, one named table per file. Cells
//! are carried as raw strings end to end; nothing is ever coerced to a
//! number, so identifiers like `007` or `1e5` survive untouched.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Textual missing-value tokens treated as true-missing when judging sheet
/// usability. The stored sheet keeps these cells verbatim.
pub const NA_TOKENS: [&str; 4] = ["NA", "na", "N/A", "n/a"];

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to read sheet {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write sheet {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// On-disk encoding of a sheet file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetFormat {
    #[default]
    Tsv,
    Csv,
}

impl SheetFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            SheetFormat::Tsv => b'\t',
            SheetFormat::Csv => b',',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SheetFormat::Tsv => "tsv",
            SheetFormat::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => SheetFormat::Csv,
            _ => SheetFormat::Tsv,
        }
    }
}

/// One named table: header plus rows of raw string cells.
///
/// Rows are always aligned to the header width; short records are padded
/// with empty cells at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub format: SheetFormat,
}

impl Sheet {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        format: SheetFormat,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            format,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Load a sheet from a delimited file. The file stem becomes the sheet
    /// name and the extension selects the delimiter.
    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let format = SheetFormat::from_path(path);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter())
            .flexible(true)
            .from_path(path)
            .map_err(|source| WorkbookError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| WorkbookError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut sheet = Sheet::new(name, columns, format);
        for record in reader.records() {
            let record = record.map_err(|source| WorkbookError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            sheet.push_row(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(sheet)
    }

    /// Write header plus rows in the sheet's current column order.
    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.format.delimiter())
            .from_path(path)
            .map_err(|source| WorkbookError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        let write_err = |source| WorkbookError::Write {
            path: path.to_path_buf(),
            source,
        };
        writer.write_record(&self.columns).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer.flush().map_err(WorkbookError::Io)?;
        Ok(())
    }

    /// Whether the sheet takes part in a run.
    ///
    /// Judged on a normalized view of the cells (NA tokens and blanks count
    /// as missing): fully-missing columns are discarded first, then
    /// fully-missing rows, and the sheet is usable iff at least one row and
    /// at least one retained column without a `.` in its name survive. The
    /// raw cells are untouched by this check.
    pub fn is_usable(&self) -> bool {
        let missing = |cell: &str| {
            let cell = cell.trim();
            cell.is_empty() || NA_TOKENS.contains(&cell)
        };

        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|&c| self.rows.iter().any(|row| !missing(&row[c])))
            .collect();
        if !kept.iter().any(|&c| !self.columns[c].contains('.')) {
            return false;
        }

        self.rows
            .iter()
            .any(|row| kept.iter().any(|&c| !missing(&row[c])))
    }
}

/// Locate the sheet file backing a node kind, trying `.tsv` then `.csv`.
pub fn sheet_path(manifest_dir: &Path, node: &str) -> Option<PathBuf> {
    for ext in ["tsv", "csv"] {
        let candidate = manifest_dir.join(format!("{node}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Whether a directory entry looks like a sheet file.
pub fn is_sheet_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("tsv") | Some("csv")
        )
}

/// Create an empty placeholder sheet file so an output artifact stays
/// structurally valid when nothing else survived.
pub fn write_placeholder(dir: &Path) -> Result<PathBuf, WorkbookError> {
    let path = dir.join("sheet1.tsv");
    File::create(&path)?;
    Ok(path)
}
