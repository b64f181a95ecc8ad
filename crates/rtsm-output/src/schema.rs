//! Export column schema.
//!
//! Header names and value rendering are dictated by the data-capture system
//! that imports the lists, so none of them is hard-coded in the views. The
//! REDCap preset follows the randomization module's allocation-table
//! conventions: `redcap_randomization_group` for the arm, coded `1`/`2`
//! values, and `redcap_data_access_group` for the site stratum.

use serde::{Deserialize, Serialize};

use rtsm_model::{Arm, Sex, TrialArms};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationColumns {
    pub sequence_id: String,
    pub site: String,
    pub sex: String,
    pub arm: String,
}

impl Default for AllocationColumns {
    fn default() -> Self {
        Self {
            sequence_id: "sequence_id".to_string(),
            site: "site".to_string(),
            sex: "sex".to_string(),
            arm: "arm".to_string(),
        }
    }
}

impl AllocationColumns {
    pub fn headers(&self) -> Vec<String> {
        vec![
            self.sequence_id.clone(),
            self.site.clone(),
            self.sex.clone(),
            self.arm.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispensingColumns {
    pub labels: String,
    pub sequence_id: String,
    pub sex: String,
    pub site: String,
}

impl Default for DispensingColumns {
    fn default() -> Self {
        Self {
            labels: "labels".to_string(),
            sequence_id: "sequence_id".to_string(),
            sex: "sex".to_string(),
            site: "site".to_string(),
        }
    }
}

impl DispensingColumns {
    pub fn headers(&self) -> Vec<String> {
        vec![
            self.labels.clone(),
            self.sequence_id.clone(),
            self.sex.clone(),
            self.site.clone(),
        ]
    }
}

/// Allocation columns followed by one column per label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedColumns {
    pub sequence_id: String,
    pub site: String,
    pub sex: String,
    pub arm: String,
    /// Label columns are named `{label_prefix}1`, `{label_prefix}2`, ...
    pub label_prefix: String,
}

impl Default for CombinedColumns {
    fn default() -> Self {
        Self {
            sequence_id: "sequence_id".to_string(),
            site: "site".to_string(),
            sex: "sex".to_string(),
            arm: "arm".to_string(),
            label_prefix: "label_".to_string(),
        }
    }
}

impl CombinedColumns {
    pub fn headers(&self, label_columns: usize) -> Vec<String> {
        let mut headers = vec![
            self.sequence_id.clone(),
            self.site.clone(),
            self.sex.clone(),
            self.arm.clone(),
        ];
        headers.extend((1..=label_columns).map(|n| format!("{}{n}", self.label_prefix)));
        headers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SexValues {
    pub male: String,
    pub female: String,
}

impl Default for SexValues {
    fn default() -> Self {
        Self {
            male: Sex::Male.as_str().to_string(),
            female: Sex::Female.as_str().to_string(),
        }
    }
}

/// What the arm column shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmValue {
    /// The configured treatment code, e.g. `2506091`.
    #[default]
    Code,
    /// `1` for arm A, `2` for arm B.
    Index,
    /// The configured description, falling back to the code.
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSchema {
    pub allocation: AllocationColumns,
    pub dispensing: DispensingColumns,
    pub combined: CombinedColumns,
    pub sex_values: SexValues,
    pub arm_value: ArmValue,
    pub sequence_prefix: String,
    pub sequence_width: usize,
    pub label_separator: String,
}

impl Default for ExportSchema {
    fn default() -> Self {
        Self {
            allocation: AllocationColumns::default(),
            dispensing: DispensingColumns::default(),
            combined: CombinedColumns::default(),
            sex_values: SexValues::default(),
            arm_value: ArmValue::default(),
            sequence_prefix: "R".to_string(),
            sequence_width: 3,
            label_separator: "/".to_string(),
        }
    }
}

impl ExportSchema {
    /// Column names and codes for a REDCap allocation-table upload.
    pub fn redcap() -> Self {
        Self {
            allocation: AllocationColumns {
                sequence_id: "redcap_randomization_number".to_string(),
                site: "redcap_data_access_group".to_string(),
                sex: "sex".to_string(),
                arm: "redcap_randomization_group".to_string(),
            },
            dispensing: DispensingColumns {
                labels: "ampoule_labels".to_string(),
                sequence_id: "redcap_randomization_number".to_string(),
                sex: "sex".to_string(),
                site: "redcap_data_access_group".to_string(),
            },
            combined: CombinedColumns {
                sequence_id: "redcap_randomization_number".to_string(),
                site: "redcap_data_access_group".to_string(),
                sex: "sex".to_string(),
                arm: "redcap_randomization_group".to_string(),
                label_prefix: "ampoule_label_".to_string(),
            },
            sex_values: SexValues {
                male: "1".to_string(),
                female: "2".to_string(),
            },
            arm_value: ArmValue::Index,
            ..Self::default()
        }
    }

    /// `R001`-style display id for a sequence number.
    pub fn sequence_id(&self, sequence: u32) -> String {
        format!(
            "{}{:0width$}",
            self.sequence_prefix,
            sequence,
            width = self.sequence_width
        )
    }

    pub fn sex_value(&self, sex: Sex) -> &str {
        match sex {
            Sex::Male => &self.sex_values.male,
            Sex::Female => &self.sex_values.female,
        }
    }

    pub fn arm_text(&self, arm: Arm, arms: &TrialArms) -> String {
        match self.arm_value {
            ArmValue::Code => arms.code(arm).to_string(),
            ArmValue::Index => match arm {
                Arm::A => "1".to_string(),
                Arm::B => "2".to_string(),
            },
            ArmValue::Description => {
                let spec = arms.get(arm);
                spec.description.clone().unwrap_or_else(|| spec.code.clone())
            }
        }
    }
}

/// Built-in schemas selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPreset {
    #[default]
    Default,
    Redcap,
}

impl SchemaPreset {
    pub fn schema(self) -> ExportSchema {
        match self {
            SchemaPreset::Default => ExportSchema::default(),
            SchemaPreset::Redcap => ExportSchema::redcap(),
        }
    }
}
