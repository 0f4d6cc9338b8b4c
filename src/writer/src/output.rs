//! Cleaned-manifest persistence.
//!
//! The output artifact is assembled in a staging directory next to its final
//! location and renamed into place, so a failed write never leaves a torn
//! artifact under the final name. The input manifest is never written to.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use common::SheetStore;
use common::workbook::{self, WorkbookError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("manifest path {} has no base name", path.display())]
    NoBaseName { path: PathBuf },
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The output pair of one run: cleaned manifest directory and text log.
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
}

/// Derive both artifact names from the input manifest's base name, the
/// configured tag, and a date stamp: `<base>_<tag><YYYYMMDD>` plus
/// `<base>_<tag><YYYYMMDD>_log.txt`.
pub fn artifact_names(
    manifest_dir: &Path,
    destination: &Path,
    tag: &str,
    date: NaiveDate,
) -> Result<ArtifactNames, PersistError> {
    let base = manifest_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PersistError::NoBaseName {
            path: manifest_dir.to_path_buf(),
        })?;
    let stem = format!("{base}_{tag}{}", date.format("%Y%m%d"));
    Ok(ArtifactNames {
        output_dir: destination.join(&stem),
        log_file: destination.join(format!("{stem}_log.txt")),
    })
}

/// Write the cleaned manifest.
///
/// The staging directory is seeded with a copy of every sheet file in the
/// input manifest (sheets outside the schema survive untouched), then every
/// node kind in the working set replaces its slot with header plus surviving
/// rows. An artifact that would otherwise hold no sheets gets an empty
/// placeholder so it stays structurally valid.
pub fn persist(
    manifest_dir: &Path,
    store: &SheetStore,
    output_dir: &Path,
) -> Result<(), PersistError> {
    let parent = output_dir.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".pruner-staging-")
        .tempdir_in(parent)?;

    for entry in fs::read_dir(manifest_dir)? {
        let path = entry?.path();
        if !workbook::is_sheet_file(&path) {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, staging.path().join(name))?;
        }
    }

    for table in store.tables() {
        let file = format!(
            "{}.{}",
            table.sheet.name,
            table.sheet.format.extension()
        );
        table.sheet.save(&staging.path().join(file))?;
    }

    if fs::read_dir(staging.path())?.next().is_none() {
        let placeholder = workbook::write_placeholder(staging.path())?;
        debug!(path = %placeholder.display(), "output had no sheets, wrote placeholder");
    }

    if output_dir.exists() {
        debug!(path = %output_dir.display(), "replacing existing output artifact");
        fs::remove_dir_all(output_dir)?;
    }

    let staged = staging.keep();
    if let Err(err) = fs::rename(&staged, output_dir) {
        let _ = fs::remove_dir_all(&staged);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::schema::NodeSchema;
    use common::store::NodeTable;
    use common::workbook::{Sheet, SheetFormat};

    fn store_with(node: &str, columns: &[&str], rows: &[&[&str]]) -> SheetStore {
        let mut sheet = Sheet::new(
            node,
            columns.iter().map(|c| c.to_string()).collect(),
            SheetFormat::Tsv,
        );
        for row in rows {
            sheet.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        let schema = NodeSchema::resolve(node, &sheet.columns);
        SheetStore::from_tables(vec![NodeTable { sheet, schema }])
    }

    #[test]
    fn test_artifact_names() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let names = artifact_names(
            Path::new("/data/manifest"),
            Path::new("/out"),
            "EntRemove",
            date,
        )
        .unwrap();
        assert_eq!(
            names.output_dir,
            PathBuf::from("/out/manifest_EntRemove20260806")
        );
        assert_eq!(
            names.log_file,
            PathBuf::from("/out/manifest_EntRemove20260806_log.txt")
        );
    }

    #[test]
    fn test_persist_replaces_node_sheets_and_keeps_others() {
        let input = tempfile::tempdir().unwrap();
        std::fs::write(
            input.path().join("study.tsv"),
            "study_id\tstudy_name\nS1\tAlpha\nS2\tBeta\n",
        )
        .unwrap();
        std::fs::write(input.path().join("notes.csv"), "k,v\na,1\n").unwrap();
        std::fs::write(input.path().join("README.md"), "not a sheet\n").unwrap();

        let store = store_with(
            "study",
            &["study_id", "study_name"],
            &[&["S2", "Beta"]],
        );

        let out_parent = tempfile::tempdir().unwrap();
        let dest = out_parent.path().join("manifest_EntRemove20260806");
        persist(input.path(), &store, &dest).unwrap();

        let study = std::fs::read_to_string(dest.join("study.tsv")).unwrap();
        assert_eq!(study, "study_id\tstudy_name\nS2\tBeta\n");
        // non-node sheet travels verbatim, non-sheet files do not
        let notes = std::fs::read_to_string(dest.join("notes.csv")).unwrap();
        assert_eq!(notes, "k,v\na,1\n");
        assert!(!dest.join("README.md").exists());

        // input untouched
        let original = std::fs::read_to_string(input.path().join("study.tsv")).unwrap();
        assert_eq!(original, "study_id\tstudy_name\nS1\tAlpha\nS2\tBeta\n");
    }

    #[test]
    fn test_persist_creates_slot_for_new_node_sheet() {
        let input = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("other.tsv"), "x\n1\n").unwrap();

        let store = store_with("study", &["study_id"], &[&["S1"]]);

        let out_parent = tempfile::tempdir().unwrap();
        let dest = out_parent.path().join("out");
        persist(input.path(), &store, &dest).unwrap();

        assert!(dest.join("study.tsv").exists());
        assert!(dest.join("other.tsv").exists());
    }

    #[test]
    fn test_persist_overwrites_previous_artifact() {
        let input = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("study.tsv"), "study_id\nS1\n").unwrap();

        let store = store_with("study", &["study_id"], &[&["S1"]]);

        let out_parent = tempfile::tempdir().unwrap();
        let dest = out_parent.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("stale.tsv"), "old\n").unwrap();

        persist(input.path(), &store, &dest).unwrap();
        assert!(!dest.join("stale.tsv").exists());
        assert!(dest.join("study.tsv").exists());
    }
}
