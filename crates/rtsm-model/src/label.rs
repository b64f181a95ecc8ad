//! Dispensing labels (ampoule / kit numbers) and their printed form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::site::SiteCode;

/// A label number drawn from a (site, arm) pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl Label {
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label numbering and rendering.
///
/// Numbers are laid out arm-major starting at `first_number`: arm A across
/// all sites in declared order, then arm B. Rendering zero-pads the number to
/// `pad_width` digits and optionally prefixes the site namespace and the arm
/// code, e.g. `centro_18_2506091007`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPlan {
    pub first_number: u32,
    pub pad_width: usize,
    /// When set, labels are rendered as `{namespace}_{site}_...`.
    pub site_namespace: Option<String>,
    pub include_arm_code: bool,
}

impl Default for LabelPlan {
    fn default() -> Self {
        Self {
            first_number: 1,
            pad_width: 3,
            site_namespace: None,
            include_arm_code: false,
        }
    }
}

impl LabelPlan {
    /// Render a label for printing and export.
    pub fn render(&self, label: Label, site: SiteCode, arm_code: &str) -> String {
        let mut out = String::new();
        if let Some(namespace) = &self.site_namespace {
            if !namespace.is_empty() {
                out.push_str(namespace);
                out.push('_');
            }
            out.push_str(&site.to_string());
            out.push('_');
        }
        if self.include_arm_code {
            out.push_str(arm_code);
        }
        out.push_str(&format!("{:0width$}", label.number(), width = self.pad_width));
        out
    }

    /// Check that the highest number still renders in `pad_width` digits.
    ///
    /// A wider number would break the fixed-width label text printed on
    /// the supply. A `pad_width` of zero disables the check.
    pub fn check_width(&self, highest: u32) -> Result<(), ConfigError> {
        if self.pad_width == 0 {
            return Ok(());
        }
        let digits = highest.to_string().len();
        if digits > self.pad_width {
            return Err(ConfigError::LabelWidthExceeded {
                number: u64::from(highest),
                width: self.pad_width,
            });
        }
        Ok(())
    }
}
