use thiserror::Error;

use crate::enums::{Arm, BlockLayout, Sex};
use crate::site::SiteCode;

/// The trial design is inconsistent. Raised before any random draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("trial design declares no sites")]
    NoSites,

    #[error("site {site} is declared more than once")]
    DuplicateSite { site: SiteCode },

    #[error("site {site} has a zero quota")]
    ZeroQuota { site: SiteCode },

    #[error("block size {block_size} is not valid for the {layout} layout: {reason}")]
    InvalidBlockSize {
        block_size: u32,
        layout: BlockLayout,
        reason: &'static str,
    },

    #[error("site {site} quota {quota} is not divisible by {divisor}")]
    QuotaNotDivisible {
        site: SiteCode,
        quota: u32,
        divisor: u32,
    },

    #[error("sum of site quotas ({sum}) does not equal the declared total ({total})")]
    QuotaMismatch { total: u32, sum: u64 },

    #[error("invalid label pool size {count} for site {site}, arm {arm}")]
    InvalidPoolSize {
        site: SiteCode,
        arm: Arm,
        count: i64,
    },

    #[error("dosing rule must dispense at least one label to {sex} participants")]
    ZeroDosing { sex: Sex },

    #[error("arm {arm} has an empty code")]
    EmptyArmCode { arm: Arm },

    #[error("both arms use the code {code:?}")]
    DuplicateArmCode { code: String },

    #[error("label numbering overflows after site {site}, arm {arm}")]
    LabelRangeOverflow { site: SiteCode, arm: Arm },

    #[error("label number {number} does not fit in {width} digits")]
    LabelWidthExceeded { number: u64, width: usize },

    #[error(
        "site {site}, arm {arm}: pool holds {available} labels but only {required} will be dispensed"
    )]
    PoolSurplus {
        site: SiteCode,
        arm: Arm,
        available: usize,
        required: usize,
    },

    #[error("no randomization seed was given")]
    MissingSeed,
}

/// Fatal errors of a randomization run. None of them is recoverable: the
/// run aborts and no partial list is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomizationError {
    #[error("invalid trial design: {0}")]
    Config(#[from] ConfigError),

    #[error("site {site}, arm {arm}: pool holds {available} labels but the sequence needs {required}")]
    InsufficientLabels {
        site: SiteCode,
        arm: Arm,
        available: usize,
        required: usize,
    },

    #[error("arm {arm}: label {number} issued more than once (sites {first_site} and {second_site})")]
    DuplicateLabel {
        arm: Arm,
        number: u32,
        first_site: SiteCode,
        second_site: SiteCode,
    },

    #[error("site {site}, arm {arm}: {remaining} labels left in the pool after assembly")]
    UndrainedPool {
        site: SiteCode,
        arm: Arm,
        remaining: usize,
    },

    #[error("allocation check failed for site {site}: {message}")]
    InvariantViolation { site: SiteCode, message: String },
}

pub type Result<T> = std::result::Result<T, RandomizationError>;
