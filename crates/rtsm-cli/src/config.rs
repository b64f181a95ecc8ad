//! Study file loading.
//!
//! A study file is TOML with a `[trial]` table describing the design and an
//! optional `[export]` table overriding the export column schema:
//!
//! ```toml
//! [trial]
//! seed = 42
//! total_quota = 32
//! sites = [{ code = 18, quota = 16 }, { code = 19, quota = 16 }]
//!
//! [trial.arms]
//! a = { code = "2506091" }
//! b = { code = "2506092" }
//!
//! [export]
//! sequence_prefix = "R"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use rtsm_model::TrialDesign;
use rtsm_output::{ExportSchema, SchemaPreset};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyFile {
    pub trial: TrialDesign,
    #[serde(default)]
    pub export: Option<ExportSchema>,
}

impl StudyFile {
    /// The design with the command-line seed applied, if one was given.
    pub fn design(&self, seed_override: Option<u64>) -> TrialDesign {
        let mut design = self.trial.clone();
        if let Some(seed) = seed_override {
            design.seed = Some(seed);
        }
        design
    }

    /// A preset chosen on the command line wins over the `[export]` table.
    pub fn schema(&self, preset: Option<SchemaPreset>) -> ExportSchema {
        match (preset, &self.export) {
            (Some(preset), _) => preset.schema(),
            (None, Some(schema)) => schema.clone(),
            (None, None) => ExportSchema::default(),
        }
    }
}

pub fn parse_study(text: &str) -> Result<StudyFile, toml::de::Error> {
    toml::from_str(text)
}

pub fn load_study(path: &Path) -> Result<StudyFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read study file {}", path.display()))?;
    parse_study(&text).with_context(|| format!("parse study file {}", path.display()))
}
