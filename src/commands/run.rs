use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Args;
use tracing::info;

use cascade::CascadeEngine;
use common::config::Configuration;
use common::{SheetStore, request, schema};
use writer::AuditLog;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Manifest directory holding one sheet file per node kind
    #[arg(short = 'f', long = "manifest", value_name = "DIR")]
    manifest: PathBuf,

    /// Template file whose Node column enumerates the node kinds
    #[arg(short = 't', long = "template", value_name = "FILE")]
    template: PathBuf,

    /// Entry list to remove, one identifier per line, no header
    #[arg(short = 'e', long = "entries", value_name = "FILE")]
    entries: PathBuf,

    /// Write artifacts here instead of the configured output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

pub fn execute(args: RunArgs, config: &Configuration) -> Result<()> {
    // Fail early on missing inputs, before anything is read or created
    for path in [&args.manifest, &args.template, &args.entries] {
        if !path.exists() {
            bail!("required input not found: {}", path.display());
        }
    }

    let node_kinds = schema::load_node_kinds(&args.template)
        .context("failed to load node kinds from template")?;
    info!(count = node_kinds.len(), "template declares node kinds");

    let mut store = SheetStore::load(&args.manifest, &node_kinds)
        .context("failed to load manifest working set")?;
    info!(sheets = store.len(), "working set loaded");

    let entries = request::load_removal_request(&args.entries)
        .with_context(|| format!("failed to read entry list {}", args.entries.display()))?;

    let destination = args
        .output_dir
        .as_deref()
        .unwrap_or(&config.output.directory);
    let names = writer::artifact_names(
        &args.manifest,
        destination,
        &config.output.tag,
        Local::now().date_naive(),
    )?;
    std::fs::create_dir_all(destination)
        .with_context(|| format!("failed to create output directory {}", destination.display()))?;

    // The log exists only once every input has loaded; fatal errors above
    // leave no artifacts behind
    let mut log = AuditLog::create(&names.log_file)?;
    let outcome = CascadeEngine::new(&mut store).run(&entries, &mut log)?;
    let log_file = log.finish()?;

    writer::persist(&args.manifest, &store, &names.output_dir)
        .context("failed to persist cleaned manifest")?;

    info!(
        run_id = %outcome.run_id,
        entries_processed = outcome.entries_processed,
        children_discovered = outcome.children_discovered,
        removed = outcome.total_removed(),
        "removal run completed"
    );
    for (node, items) in &outcome.deletions {
        info!(node = %node, removed = items.len(), "sheet summary");
    }

    println!("✅ Done. Log written to {}", log_file.display());
    println!("   Cleaned manifest: {}", names.output_dir.display());
    Ok(())
}
