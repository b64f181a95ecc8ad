use serde::{Deserialize, Serialize};

use crate::enums::{Arm, Cell, Sex};
use crate::label::Label;
use crate::site::SiteCode;

/// One randomized participant slot and the labels dispensed to it.
///
/// Records are created by the assembler in generation order and never
/// mutated afterwards. `sequence` starts at 1 and increases across the whole
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub sequence: u32,
    pub site: SiteCode,
    pub sex: Sex,
    pub arm: Arm,
    pub labels: Vec<Label>,
}

impl AllocationRecord {
    pub fn cell(&self) -> Cell {
        Cell::new(self.sex, self.arm)
    }
}
