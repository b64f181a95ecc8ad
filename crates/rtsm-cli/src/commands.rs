use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use rtsm_core::{plan_pools, randomize};
use rtsm_output::{OutputOptions, SchemaPreset, write_outputs};

use rtsm_cli::config::load_study;

use crate::cli::{CheckArgs, RandomizeArgs};
use crate::types::{CheckResult, RandomizeResult};

pub fn run_randomize(args: &RandomizeArgs) -> Result<RandomizeResult> {
    let study_file = &args.study_file;
    let study_span = info_span!("study", file = %study_file.display());
    let _study_guard = study_span.enter();

    let study = load_study(study_file)?;
    let design = study.design(args.seed);
    let schema = study.schema(args.schema.map(SchemaPreset::from));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(study_file));

    let run = randomize(&design).context("randomization failed")?;

    let outputs = if args.dry_run {
        info!("dry run, no files written");
        None
    } else {
        let options = OutputOptions::default()
            .with_bom(args.bom)
            .with_combined(args.combined);
        let paths = write_outputs(&output_dir, &run, &design, &schema, &options)
            .with_context(|| format!("write outputs to {}", output_dir.display()))?;
        Some(paths)
    };

    Ok(RandomizeResult {
        study_file: study_file.clone(),
        design,
        run,
        outputs,
        output_dir,
    })
}

/// Validate the design and lay out the label pools without drawing any
/// randomness.
pub fn run_check(args: &CheckArgs) -> Result<CheckResult> {
    let study = load_study(&args.study_file)?;
    let design = study.design(args.seed);
    design.validate().context("invalid trial design")?;
    let pool_plan = plan_pools(&design).context("invalid label plan")?;
    if design.seed.is_none() {
        warn!("no seed configured; randomize will need --seed");
    }
    info!(
        sites = design.sites.len(),
        pools = pool_plan.len(),
        "study file is valid"
    );
    Ok(CheckResult {
        study_file: args.study_file.clone(),
        design,
        pool_plan,
    })
}

fn default_output_dir(study_file: &Path) -> PathBuf {
    study_file
        .parent()
        .map_or_else(|| PathBuf::from("output"), |dir| dir.join("output"))
}
