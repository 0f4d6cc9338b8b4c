use std::fs;
use std::path::{Path, PathBuf};

use cascade::{CascadeEngine, CascadeOutcome};
use chrono::NaiveDate;
use common::{SheetStore, request, schema};
use writer::{ArtifactNames, AuditLog};

fn write(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join(file), content).unwrap();
}

/// The worked example: a study sheet and a sample sheet linked through
/// `sample.study_id`.
fn study_sample_fixture(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let manifest = root.join("manifest");
    fs::create_dir_all(&manifest).unwrap();
    write(
        &manifest,
        "study.tsv",
        "study_id\tstudy_name\nS1\tAlpha\nS2\tBeta\n",
    );
    write(
        &manifest,
        "sample.tsv",
        "sample_id\tsample.study_id\tsample_type\nA\tS1\ttumor\nB\tS1\tnormal\nC\tS2\ttumor\n",
    );
    write(
        root,
        "template.tsv",
        "Node\tProperty\nstudy\tstudy_id\nsample\tsample_type\nsample\tsample.study_id\n",
    );
    write(root, "entries.tsv", "S1\n");
    (
        manifest,
        root.join("template.tsv"),
        root.join("entries.tsv"),
    )
}

/// Drive the full pipeline the way the binary does, with a fixed date
/// stamp so artifact names are predictable.
fn run_pipeline(
    manifest: &Path,
    template: &Path,
    entries: &Path,
    destination: &Path,
) -> (CascadeOutcome, ArtifactNames) {
    let node_kinds = schema::load_node_kinds(template).unwrap();
    let mut store = SheetStore::load(manifest, &node_kinds).unwrap();
    let entry_list = request::load_removal_request(entries).unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
    let names = writer::artifact_names(manifest, destination, "EntRemove", date).unwrap();
    fs::create_dir_all(destination).unwrap();

    let mut log = AuditLog::create(&names.log_file).unwrap();
    let outcome = CascadeEngine::new(&mut store)
        .run(&entry_list, &mut log)
        .unwrap();
    log.finish().unwrap();

    writer::persist(manifest, &store, &names.output_dir).unwrap();
    (outcome, names)
}

#[test]
fn test_study_sample_scenario_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let (manifest, template, entries) = study_sample_fixture(root.path());
    let input_study = fs::read(manifest.join("study.tsv")).unwrap();
    let input_sample = fs::read(manifest.join("sample.tsv")).unwrap();

    let out = root.path().join("out");
    let (outcome, names) = run_pipeline(&manifest, &template, &entries, &out);

    // deletion record: {study: [S1], sample: [A, B]}
    assert_eq!(outcome.removed("study"), ["S1"]);
    assert_eq!(outcome.removed("sample"), ["A", "B"]);

    // surviving rows
    let study = fs::read_to_string(names.output_dir.join("study.tsv")).unwrap();
    assert_eq!(study, "study_id\tstudy_name\nS2\tBeta\n");
    let sample = fs::read_to_string(names.output_dir.join("sample.tsv")).unwrap();
    assert_eq!(
        sample,
        "sample_id\tsample.study_id\tsample_type\nC\tS2\ttumor\n"
    );

    // audit trail: removal of S1 precedes the discoveries, which precede
    // the removals of A and B
    let log = fs::read_to_string(&names.log_file).unwrap();
    let pos = |needle: &str| log.find(needle).unwrap_or_else(|| panic!("missing: {needle}"));
    assert!(log.starts_with("Entries to remove (and discovered children):\nS1\n"));
    assert!(pos("S1 dropped from study.study_id") < pos("discovered child A"));
    assert!(pos("discovered child A") < pos("discovered child B"));
    assert!(pos("discovered child B") < pos("A dropped from sample.sample_id"));
    assert!(pos("A dropped from sample.sample_id") < pos("B dropped from sample.sample_id"));
    assert!(log.contains(" study: [S1]\n"));
    assert!(log.contains(" sample: [A, B]\n"));

    // the input manifest is byte-identical afterwards
    assert_eq!(fs::read(manifest.join("study.tsv")).unwrap(), input_study);
    assert_eq!(fs::read(manifest.join("sample.tsv")).unwrap(), input_sample);
}

#[test]
fn test_rerun_on_cleaned_output_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let (manifest, template, entries) = study_sample_fixture(root.path());

    let out = root.path().join("out");
    let (_, names) = run_pipeline(&manifest, &template, &entries, &out);

    // feed the cleaned manifest back through with the same request
    let out2 = root.path().join("out2");
    let (second, _) = run_pipeline(&names.output_dir, &template, &entries, &out2);
    assert_eq!(second.total_removed(), 0);
    assert_eq!(second.children_discovered, 0);
}

#[test]
fn test_deterministic_across_runs() {
    let root_a = tempfile::tempdir().unwrap();
    let root_b = tempfile::tempdir().unwrap();
    let (manifest_a, template_a, entries_a) = study_sample_fixture(root_a.path());
    let (manifest_b, template_b, entries_b) = study_sample_fixture(root_b.path());

    let (_, names_a) = run_pipeline(
        &manifest_a,
        &template_a,
        &entries_a,
        &root_a.path().join("out"),
    );
    let (_, names_b) = run_pipeline(
        &manifest_b,
        &template_b,
        &entries_b,
        &root_b.path().join("out"),
    );

    for sheet in ["study.tsv", "sample.tsv"] {
        assert_eq!(
            fs::read(names_a.output_dir.join(sheet)).unwrap(),
            fs::read(names_b.output_dir.join(sheet)).unwrap(),
        );
    }
    assert_eq!(
        fs::read(&names_a.log_file).unwrap(),
        fs::read(&names_b.log_file).unwrap(),
    );
}

#[test]
fn test_absent_entry_leaves_dataset_unchanged() {
    let root = tempfile::tempdir().unwrap();
    let (manifest, template, _) = study_sample_fixture(root.path());
    write(root.path(), "entries.tsv", "missing-entry\n");

    let out = root.path().join("out");
    let (outcome, names) = run_pipeline(&manifest, &template, &root.path().join("entries.tsv"), &out);

    assert_eq!(outcome.total_removed(), 0);
    assert_eq!(
        fs::read(names.output_dir.join("study.tsv")).unwrap(),
        fs::read(manifest.join("study.tsv")).unwrap(),
    );
    let log = fs::read_to_string(&names.log_file).unwrap();
    assert!(log.contains(" study: []\n"));
    assert!(log.contains(" sample: []\n"));
}

#[test]
fn test_link_only_sheet_is_invisible_to_the_run() {
    let root = tempfile::tempdir().unwrap();
    let (manifest, _, _) = study_sample_fixture(root.path());
    // a sheet with only link columns: excluded from the working set, so an
    // entry that exists only there is never found
    write(&manifest, "aliquot.tsv", "aliquot.sample_id\nA\n");
    write(
        root.path(),
        "template.tsv",
        "Node\tProperty\nstudy\tstudy_id\nsample\tsample_type\nsample\tsample.study_id\naliquot\taliquot.sample_id\n",
    );

    let out = root.path().join("out");
    let (outcome, names) = run_pipeline(
        &manifest,
        &root.path().join("template.tsv"),
        &root.path().join("entries.tsv"),
        &out,
    );

    assert_eq!(outcome.removed("aliquot"), Vec::<String>::new().as_slice());
    let log = fs::read_to_string(&names.log_file).unwrap();
    assert!(!log.contains("aliquot:"));
    // the excluded sheet still travels to the output verbatim
    assert_eq!(
        fs::read_to_string(names.output_dir.join("aliquot.tsv")).unwrap(),
        "aliquot.sample_id\nA\n"
    );
}

#[test]
fn test_cyclic_reference_data_terminates() {
    let root = tempfile::tempdir().unwrap();
    let manifest = root.path().join("manifest");
    fs::create_dir_all(&manifest).unwrap();
    write(&manifest, "a.tsv", "a_id\ta.b_id\ta_note\nA1\tB1\tx\n");
    write(&manifest, "b.tsv", "b_id\tb.a_id\tb_note\nB1\tA1\ty\n");
    write(root.path(), "template.tsv", "Node\na\nb\n");
    write(root.path(), "entries.tsv", "A1\n");

    let out = root.path().join("out");
    let (outcome, names) = run_pipeline(
        &manifest,
        &root.path().join("template.tsv"),
        &root.path().join("entries.tsv"),
        &out,
    );

    assert_eq!(outcome.removed("a"), ["A1"]);
    assert_eq!(outcome.removed("b"), ["B1"]);
    let a = fs::read_to_string(names.output_dir.join("a.tsv")).unwrap();
    assert_eq!(a, "a_id\ta.b_id\ta_note\n");
}
