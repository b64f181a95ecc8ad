use std::path::PathBuf;

use rtsm_core::{PoolPlan, Randomization};
use rtsm_model::TrialDesign;
use rtsm_output::OutputPaths;

#[derive(Debug)]
pub struct RandomizeResult {
    pub study_file: PathBuf,
    pub design: TrialDesign,
    pub run: Randomization,
    /// `None` on a dry run.
    pub outputs: Option<OutputPaths>,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub struct CheckResult {
    pub study_file: PathBuf,
    pub design: TrialDesign,
    pub pool_plan: Vec<PoolPlan>,
}
