//! Example fixture generation, for trying the tool end to end.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use common::workbook::{Sheet, SheetFormat};

#[derive(Args, Debug)]
pub struct ExamplesArgs {
    /// Directory to write the example files into
    #[arg(long, value_name = "DIR", default_value = ".")]
    dir: PathBuf,
}

fn sheet(name: &str, columns: &[&str], rows: &[&[&str]]) -> Sheet {
    let mut sheet = Sheet::new(
        name,
        columns.iter().map(|c| c.to_string()).collect(),
        SheetFormat::Tsv,
    );
    for row in rows {
        sheet.push_row(row.iter().map(|c| c.to_string()).collect());
    }
    sheet
}

/// Write `template.tsv`, a `manifest/` directory, and `entries.tsv` wired
/// together so that `run` removes study S1 and its two samples.
pub fn execute(args: ExamplesArgs) -> Result<()> {
    write_into(&args.dir)?;
    println!("Generated: template.tsv, manifest/, entries.tsv");
    Ok(())
}

pub fn write_into(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let template = sheet(
        "template",
        &["Node", "Property"],
        &[
            &["study", "study_id"],
            &["sample", "sample_type"],
            &["sample", "sample.study_id"],
        ],
    );
    template.save(&dir.join("template.tsv"))?;

    let manifest = dir.join("manifest");
    std::fs::create_dir_all(&manifest)
        .with_context(|| format!("failed to create {}", manifest.display()))?;

    let study = sheet(
        "study",
        &["study_id", "study_name"],
        &[&["S1", "Alpha"], &["S2", "Beta"]],
    );
    study.save(&manifest.join("study.tsv"))?;

    let sample = sheet(
        "sample",
        &["sample_id", "sample.study_id", "sample_type"],
        &[
            &["A", "S1", "tumor"],
            &["B", "S1", "normal"],
            &["C", "S2", "tumor"],
        ],
    );
    sample.save(&manifest.join("sample.tsv"))?;

    std::fs::write(dir.join("entries.tsv"), "S1\n")
        .with_context(|| format!("failed to write {}", dir.join("entries.tsv").display()))?;
    Ok(())
}
