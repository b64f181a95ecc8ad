pub mod design;
pub mod enums;
pub mod error;
pub mod label;
pub mod record;
pub mod site;

pub use design::{ArmSpec, DEFAULT_BLOCK_SIZE, DosingRule, TrialArms, TrialDesign};
pub use enums::{Arm, BlockLayout, Cell, Sex};
pub use error::{ConfigError, RandomizationError, Result};
pub use label::{Label, LabelPlan};
pub use record::AllocationRecord;
pub use site::{SiteCode, SiteQuota};
