//! Writing a full run to disk.

use std::fs;
use std::path::Path;

use rtsm_core::randomize;
use rtsm_model::{ArmSpec, SiteQuota, TrialArms, TrialDesign};
use rtsm_output::{ExportSchema, OutputOptions, RunManifest, write_outputs};

fn design() -> TrialDesign {
    TrialDesign::new(
        TrialArms::new(ArmSpec::new("2506091"), ArmSpec::new("2506092")),
        vec![SiteQuota::new(18, 8), SiteQuota::new(19, 4)],
    )
    .with_seed(42)
}

#[test]
fn writes_both_views_and_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("lists");
    let design = design();
    let run = randomize(&design).expect("randomize");

    let paths = write_outputs(
        &out,
        &run,
        &design,
        &ExportSchema::default(),
        &OutputOptions::default(),
    )
    .expect("write outputs");

    let allocation_path = paths.allocation.expect("allocation path");
    let allocation = fs::read_to_string(&allocation_path).expect("read allocation");
    let mut lines = allocation.lines();
    assert_eq!(lines.next(), Some("sequence_id,site,sex,arm"));
    assert_eq!(lines.count(), 12);
    assert_eq!(allocation_path, out.join("allocation.csv"));

    let dispensing =
        fs::read_to_string(paths.dispensing.expect("dispensing path")).expect("read dispensing");
    assert!(dispensing.starts_with("labels,sequence_id,sex,site\n"));
    assert_eq!(dispensing.lines().count(), 13);

    let manifest_json =
        fs::read_to_string(paths.manifest.expect("manifest path")).expect("read manifest");
    let manifest: RunManifest = serde_json::from_str(&manifest_json).expect("parse manifest");
    assert_eq!(manifest.seed, 42);
    assert_eq!(manifest.records, 12);
    assert_eq!(manifest.total_quota, 12);
    assert_eq!(manifest.list_digest, run.allocation.digest);
    assert_eq!(manifest.arms.len(), 2);
    assert_eq!(manifest.arms[0].code, "2506091");
    assert_eq!(manifest.arms[0].records, 6);
    // 3 males at 2 units plus 3 females at 1 unit.
    assert_eq!(manifest.arms[0].labels, 9);
    assert_eq!(manifest.arms[1].labels, 9);
}

#[test]
fn same_seed_writes_identical_lists() {
    let design = design();
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    let schema = ExportSchema::default();
    let options = OutputOptions::default();

    for dir in [&first, &second] {
        let run = randomize(&design).expect("randomize");
        write_outputs(dir.path(), &run, &design, &schema, &options).expect("write outputs");
    }

    for name in ["allocation.csv", "dispensing.csv"] {
        let a = fs::read(first.path().join(name)).expect("read first");
        let b = fs::read(second.path().join(name)).expect("read second");
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn bom_and_custom_file_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let design = design();
    let run = randomize(&design).expect("randomize");
    let options = OutputOptions {
        allocation_file: "alloc.csv".to_string(),
        ..OutputOptions::default()
    }
    .with_bom(true);

    let paths = write_outputs(dir.path(), &run, &design, &ExportSchema::redcap(), &options)
        .expect("write outputs");

    assert_eq!(paths.allocation, Some(dir.path().join("alloc.csv")));
    let bytes = fs::read(dir.path().join("alloc.csv")).expect("read allocation");
    assert!(bytes.starts_with(b"\xEF\xBB\xBFredcap_randomization_number,"));
}

#[test]
fn combined_file_is_opt_in() {
    let dir = tempfile::tempdir().expect("tempdir");
    let design = design();
    let run = randomize(&design).expect("randomize");
    let schema = ExportSchema::default();

    let paths = write_outputs(dir.path(), &run, &design, &schema, &OutputOptions::default())
        .expect("write outputs");
    assert_eq!(paths.combined, None);
    assert!(!dir.path().join("combined.csv").exists());

    let options = OutputOptions::default().with_combined(true);
    let paths = write_outputs(dir.path(), &run, &design, &schema, &options).expect("write outputs");
    let combined_path = paths.combined.clone().expect("combined path");
    assert_eq!(combined_path, dir.path().join("combined.csv"));
    let combined = fs::read_to_string(&combined_path).expect("read combined");
    assert!(combined.starts_with("sequence_id,site,sex,arm,label_1,label_2\n"));
    assert_eq!(combined.lines().count(), 13);

    let manifest: RunManifest =
        serde_json::from_str(&fs::read_to_string(dir.path().join("manifest.json")).expect("read"))
            .expect("parse manifest");
    assert_eq!(manifest.files, paths);
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.is_file())
        .map(|path| {
            let name = path.file_name().expect("file name").to_string_lossy().into_owned();
            let bytes = fs::read(&path).expect("read file");
            (name, bytes)
        })
        .collect();
    files.sort();
    files
}

#[test]
fn blocked_target_leaves_previous_run_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = ExportSchema::default();
    let options = OutputOptions::default();
    let first = design();
    let run = randomize(&first).expect("randomize");
    write_outputs(dir.path(), &run, &first, &schema, &options).expect("first write");

    fs::remove_file(dir.path().join("dispensing.csv")).expect("remove dispensing");
    fs::create_dir(dir.path().join("dispensing.csv")).expect("block dispensing");
    let before = snapshot(dir.path());

    let second = design().with_seed(7);
    let run = randomize(&second).expect("randomize");
    let error = write_outputs(dir.path(), &run, &second, &schema, &options)
        .expect_err("dispensing target is a directory");

    assert!(error.to_string().contains("dispensing.csv"));
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn failed_write_discards_staged_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = ExportSchema::default();
    let options = OutputOptions::default();
    let first = design();
    let run = randomize(&first).expect("randomize");
    write_outputs(dir.path(), &run, &first, &schema, &options).expect("first write");
    let before = snapshot(dir.path());

    // The manifest is staged last; a directory in its way fails the run
    // after both CSV files have been written.
    fs::create_dir(dir.path().join("manifest.json.tmp")).expect("block manifest staging");

    let second = design().with_seed(7);
    let run = randomize(&second).expect("randomize");
    assert!(write_outputs(dir.path(), &run, &second, &schema, &options).is_err());

    assert_eq!(snapshot(dir.path()), before);
    assert!(!dir.path().join("allocation.csv.tmp").exists());
    assert!(!dir.path().join("dispensing.csv.tmp").exists());
}
