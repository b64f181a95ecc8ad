//! Type-safe enumerations for the two stratification factors and the
//! block layout.
//!
//! Both `Sex` and `Arm` have a fixed cardinality of two. The randomization
//! core relies on that: a balanced block is built from the four crossed
//! (sex, arm) cells.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant sex, the second stratification factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Both categories in canonical order (male first).
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Treatment arm slot. The trial always has exactly two arms; their codes
/// and descriptions live in [`crate::TrialArms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arm {
    A,
    B,
}

impl Arm {
    /// Both arms in label-numbering order (arm A is numbered first).
    pub const ALL: [Arm; 2] = [Arm::A, Arm::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::A => "A",
            Arm::B => "B",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One crossed stratification cell: the unit a block is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub sex: Sex,
    pub arm: Arm,
}

impl Cell {
    /// Canonical block composition: male-A, male-B, female-A, female-B.
    pub const ALL: [Cell; 4] = [
        Cell::new(Sex::Male, Arm::A),
        Cell::new(Sex::Male, Arm::B),
        Cell::new(Sex::Female, Arm::A),
        Cell::new(Sex::Female, Arm::B),
    ];

    pub const fn new(sex: Sex, arm: Arm) -> Self {
        Self { sex, arm }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sex, self.arm)
    }
}

/// How a site's enrollment sequence is composed from blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLayout {
    /// Each block holds every (sex, arm) cell equally and is shuffled as a
    /// whole. Balance holds for both factors at every block boundary.
    #[default]
    Crossed,
    /// Each sex gets its own sequence of arm-balanced blocks; the male
    /// sequence is listed before the female sequence within a site.
    NestedBySex,
}

impl BlockLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockLayout::Crossed => "crossed",
            BlockLayout::NestedBySex => "nested_by_sex",
        }
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_cells_cover_both_factors() {
        for sex in Sex::ALL {
            for arm in Arm::ALL {
                assert_eq!(
                    Cell::ALL.iter().filter(|c| **c == Cell::new(sex, arm)).count(),
                    1
                );
            }
        }
    }

    #[test]
    fn test_layout_serde_names() {
        let layout: BlockLayout = serde_json::from_str("\"nested_by_sex\"").unwrap();
        assert_eq!(layout, BlockLayout::NestedBySex);
        assert_eq!(BlockLayout::default().to_string(), "crossed");
    }
}
