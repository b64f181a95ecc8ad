use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric site (centre) code as used on labels and in the data-capture system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteCode(pub u32);

impl SiteCode {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

/// A site and the number of participants it must randomize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteQuota {
    pub code: SiteCode,
    pub quota: u32,
}

impl SiteQuota {
    pub fn new(code: impl Into<SiteCode>, quota: u32) -> Self {
        Self {
            code: code.into(),
            quota,
        }
    }
}
