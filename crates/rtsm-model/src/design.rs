//! Trial design configuration.
//!
//! A [`TrialDesign`] is loaded once before randomization and never mutated
//! by the core. [`TrialDesign::validate`] checks every structural rule up
//! front so that a broken design fails before a single random draw.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::{Arm, BlockLayout, Cell, Sex};
use crate::error::ConfigError;
use crate::label::LabelPlan;
use crate::site::{SiteCode, SiteQuota};

/// Block size of the reference trial: one slot per (sex, arm) cell.
pub const DEFAULT_BLOCK_SIZE: u32 = 4;

/// Code and optional description of one treatment arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmSpec {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ArmSpec {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The two arms of the trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialArms {
    pub a: ArmSpec,
    pub b: ArmSpec,
}

impl TrialArms {
    pub fn new(a: ArmSpec, b: ArmSpec) -> Self {
        Self { a, b }
    }

    pub fn get(&self, arm: Arm) -> &ArmSpec {
        match arm {
            Arm::A => &self.a,
            Arm::B => &self.b,
        }
    }

    pub fn code(&self, arm: Arm) -> &str {
        &self.get(arm).code
    }
}

/// Number of labels dispensed per participant, by sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosingRule {
    pub male: u32,
    pub female: u32,
}

impl Default for DosingRule {
    fn default() -> Self {
        Self { male: 2, female: 1 }
    }
}

impl DosingRule {
    pub fn units(&self, sex: Sex) -> u32 {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }

    /// Labels one arm consumes at a site of the given quota.
    ///
    /// Each arm receives half the site and each sex half of that, so every
    /// (sex, arm) cell holds `quota / 4` participants. With the reference
    /// rule (2 / 1) this is `3 * quota / 4`.
    pub fn labels_per_arm(&self, quota: u32) -> u64 {
        u64::from(quota / Cell::ALL.len() as u32) * (u64::from(self.male) + u64::from(self.female))
    }
}

fn default_block_size() -> u32 {
    DEFAULT_BLOCK_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDesign {
    /// Randomization seed. Required before a run; there is no implicit default.
    #[serde(default)]
    pub seed: Option<u64>,
    pub total_quota: u32,
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    #[serde(default)]
    pub layout: BlockLayout,
    pub sites: Vec<SiteQuota>,
    pub arms: TrialArms,
    #[serde(default)]
    pub dosing: DosingRule,
    #[serde(default)]
    pub labels: LabelPlan,
}

impl TrialDesign {
    /// Build a design whose declared total is the sum of the site quotas,
    /// with the reference block size, layout, dosing rule and label plan.
    pub fn new(arms: TrialArms, sites: Vec<SiteQuota>) -> Self {
        let total = sites.iter().map(|site| site.quota).sum();
        Self {
            seed: None,
            total_quota: total,
            block_size: DEFAULT_BLOCK_SIZE,
            layout: BlockLayout::default(),
            sites,
            arms,
            dosing: DosingRule::default(),
            labels: LabelPlan::default(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_total_quota(mut self, total: u32) -> Self {
        self.total_quota = total;
        self
    }

    #[must_use]
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_dosing(mut self, dosing: DosingRule) -> Self {
        self.dosing = dosing;
        self
    }

    #[must_use]
    pub fn with_labels(mut self, labels: LabelPlan) -> Self {
        self.labels = labels;
        self
    }

    pub fn require_seed(&self) -> Result<u64, ConfigError> {
        self.seed.ok_or(ConfigError::MissingSeed)
    }

    pub fn site_codes(&self) -> impl Iterator<Item = SiteCode> + '_ {
        self.sites.iter().map(|site| site.code)
    }

    /// Every site quota must be a multiple of this number.
    ///
    /// Crossed blocks need `block_size` to be a multiple of the four cells.
    /// Nested blocks are arm-balanced within one sex, so `block_size` must
    /// be even and each sex (half the quota) must hold whole blocks.
    pub fn quota_divisor(&self) -> Result<u32, ConfigError> {
        let block_size = self.block_size;
        let invalid = |reason| ConfigError::InvalidBlockSize {
            block_size,
            layout: self.layout,
            reason,
        };
        match self.layout {
            BlockLayout::Crossed => {
                if block_size == 0 || block_size % Cell::ALL.len() as u32 != 0 {
                    return Err(invalid("must be a positive multiple of 4"));
                }
                Ok(block_size)
            }
            BlockLayout::NestedBySex => {
                if block_size == 0 || block_size % 2 != 0 {
                    return Err(invalid("must be a positive even number"));
                }
                block_size
                    .checked_mul(2)
                    .ok_or_else(|| invalid("too large"))
            }
        }
    }

    /// Validate the whole design. Does not require the seed, so a design can
    /// be checked before a seed is chosen.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_arms()?;
        for sex in Sex::ALL {
            if self.dosing.units(sex) == 0 {
                return Err(ConfigError::ZeroDosing { sex });
            }
        }
        let divisor = self.quota_divisor()?;
        if self.sites.is_empty() {
            return Err(ConfigError::NoSites);
        }

        let mut seen = BTreeSet::new();
        let mut sum = 0u64;
        for site in &self.sites {
            if !seen.insert(site.code) {
                return Err(ConfigError::DuplicateSite { site: site.code });
            }
            if site.quota == 0 {
                return Err(ConfigError::ZeroQuota { site: site.code });
            }
            if site.quota % divisor != 0 {
                return Err(ConfigError::QuotaNotDivisible {
                    site: site.code,
                    quota: site.quota,
                    divisor,
                });
            }
            sum += u64::from(site.quota);
        }
        if sum != u64::from(self.total_quota) {
            return Err(ConfigError::QuotaMismatch {
                total: self.total_quota,
                sum,
            });
        }
        Ok(())
    }

    fn validate_arms(&self) -> Result<(), ConfigError> {
        for arm in Arm::ALL {
            if self.arms.code(arm).trim().is_empty() {
                return Err(ConfigError::EmptyArmCode { arm });
            }
        }
        if self.arms.a.code == self.arms.b.code {
            return Err(ConfigError::DuplicateArmCode {
                code: self.arms.a.code.clone(),
            });
        }
        Ok(())
    }
}
