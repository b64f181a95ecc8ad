//! Run manifest: what was generated, from which design and seed.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use rtsm_core::{Randomization, sha256_hex};
use rtsm_model::{Arm, TrialDesign};

use crate::error::OutputError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub allocation: Option<PathBuf>,
    pub dispensing: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined: Option<PathBuf>,
}

impl OutputPaths {
    /// Every path that is set, in write order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.allocation, &self.dispensing, &self.combined, &self.manifest]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmManifest {
    pub code: String,
    pub records: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub seed: u64,
    pub layout: String,
    pub block_size: u32,
    pub total_quota: u32,
    pub records: usize,
    pub shuffles: u64,
    pub arms: Vec<ArmManifest>,
    /// SHA-256 of the canonical allocation list.
    pub list_digest: String,
    /// SHA-256 of the design as JSON.
    pub design_digest: String,
    pub files: OutputPaths,
}

impl RunManifest {
    pub fn new(
        run: &Randomization,
        design: &TrialDesign,
        files: OutputPaths,
    ) -> Result<Self, OutputError> {
        let design_json = serde_json::to_vec(design)?;
        let allocation = &run.allocation;
        let arms = Arm::ALL
            .iter()
            .map(|arm| ArmManifest {
                code: design.arms.code(*arm).to_string(),
                records: allocation.records.iter().filter(|r| r.arm == *arm).count(),
                labels: allocation.balance.total_labels(*arm),
            })
            .collect();
        Ok(Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            seed: run.seed,
            layout: design.layout.to_string(),
            block_size: design.block_size,
            total_quota: design.total_quota,
            records: allocation.records.len(),
            shuffles: run.shuffles,
            arms,
            list_digest: allocation.digest.clone(),
            design_digest: sha256_hex(&design_json),
            files,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|error| OutputError::io(path, error))
    }
}
