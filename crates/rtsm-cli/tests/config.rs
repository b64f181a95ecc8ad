//! Study file parsing against on-disk fixtures.

use std::fs;
use std::path::PathBuf;

use rtsm_cli::config::{StudyFile, load_study, parse_study};
use rtsm_model::{BlockLayout, DosingRule, SiteQuota};
use rtsm_output::{ArmValue, ExportSchema, SchemaPreset};

const STUDY: &str = r#"
[trial]
seed = 42
total_quota = 32
layout = "nested_by_sex"
block_size = 4
sites = [
    { code = 18, quota = 16 },
    { code = 19, quota = 16 },
]

[trial.arms]
a = { code = "2506091", description = "Oxandrolone" }
b = { code = "2506092", description = "Placebo" }

[trial.labels]
site_namespace = "centro"
include_arm_code = true

[export]
sequence_prefix = "RND"
arm_value = "description"

[export.allocation]
arm = "group"
"#;

fn write_fixture(dir: &tempfile::TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("study.toml");
    fs::write(&path, text).expect("write fixture");
    path
}

#[test]
fn loads_trial_and_export_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(&dir, STUDY);

    let study = load_study(&path).expect("load study");

    let design = study.design(None);
    assert_eq!(design.seed, Some(42));
    assert_eq!(design.layout, BlockLayout::NestedBySex);
    assert_eq!(design.sites, vec![SiteQuota::new(18, 16), SiteQuota::new(19, 16)]);
    assert_eq!(design.dosing, DosingRule::default());
    assert_eq!(design.labels.site_namespace.as_deref(), Some("centro"));
    assert!(design.labels.include_arm_code);
    assert!(design.validate().is_ok());

    let schema = study.schema(None);
    assert_eq!(schema.sequence_prefix, "RND");
    assert_eq!(schema.arm_value, ArmValue::Description);
    assert_eq!(schema.allocation.arm, "group");
    assert_eq!(schema.dispensing, ExportSchema::default().dispensing);
}

#[test]
fn command_line_overrides_win() {
    let study = parse_study(STUDY).expect("parse study");
    assert_eq!(study.design(Some(7)).seed, Some(7));
    assert_eq!(study.schema(Some(SchemaPreset::Redcap)), ExportSchema::redcap());
}

#[test]
fn export_table_is_optional() {
    let text = r#"
[trial]
total_quota = 4
sites = [{ code = 3, quota = 4 }]
arms = { a = { code = "A1" }, b = { code = "B1" } }
"#;
    let study: StudyFile = parse_study(text).expect("parse study");
    assert_eq!(study.export, None);
    assert_eq!(study.schema(None), ExportSchema::default());
    assert_eq!(study.design(None).seed, None);
    assert!(study.design(None).require_seed().is_err());
}

#[test]
fn unknown_top_level_table_is_rejected() {
    let text = r#"
[trial]
total_quota = 4
sites = [{ code = 3, quota = 4 }]
arms = { a = { code = "A1" }, b = { code = "B1" } }

[exports]
sequence_prefix = "X"
"#;
    assert!(parse_study(text).is_err());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");
    let error = load_study(&path).expect_err("missing file");
    assert!(format!("{error:#}").contains("absent.toml"));
}

#[test]
fn malformed_toml_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(&dir, "[trial\nseed = 1");
    let error = load_study(&path).expect_err("malformed file");
    let message = format!("{error:#}");
    assert!(message.contains("parse study file"));
    assert!(message.contains("study.toml"));
}

#[test]
fn bundled_demo_study_randomizes() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/imox.toml");
    let study = load_study(&path).expect("load demo study");
    let design = study.design(None);

    let run = rtsm_core::randomize(&design).expect("randomize demo");

    assert_eq!(run.allocation.records.len(), 160);
    assert_eq!(run.allocation.pool_plan.len(), 20);
    assert_eq!(run.allocation.pool_plan[9].last(), Some(120));
    assert_eq!(run.allocation.pool_plan[19].last(), Some(240));
    assert_eq!(
        run.allocation.digest,
        "ce186f97681d5c14a008bf5e638ae3b6a461a81b5d68ae5f6f672a18dbe61273"
    );
}
