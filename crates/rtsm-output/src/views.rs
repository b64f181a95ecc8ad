//! The downstream views of an allocation list.
//!
//! All are projections of the same records in the same order; only the
//! columns differ.

use serde::Serialize;

use rtsm_model::{AllocationRecord, Sex, TrialDesign};

use crate::schema::ExportSchema;

/// A rendered view: header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|header| header == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

/// Allocation-only view: sequence id, site, sex, arm.
pub fn allocation_view(
    records: &[AllocationRecord],
    design: &TrialDesign,
    schema: &ExportSchema,
) -> Table {
    let rows = records
        .iter()
        .map(|record| {
            vec![
                schema.sequence_id(record.sequence),
                record.site.to_string(),
                schema.sex_value(record.sex).to_string(),
                schema.arm_text(record.arm, &design.arms),
            ]
        })
        .collect();
    Table {
        headers: schema.allocation.headers(),
        rows,
    }
}

/// Label-dispensing view: labels, sequence id, sex, site.
pub fn dispensing_view(
    records: &[AllocationRecord],
    design: &TrialDesign,
    schema: &ExportSchema,
) -> Table {
    let rows = records
        .iter()
        .map(|record| {
            vec![
                render_labels(record, design, schema),
                schema.sequence_id(record.sequence),
                schema.sex_value(record.sex).to_string(),
                record.site.to_string(),
            ]
        })
        .collect();
    Table {
        headers: schema.dispensing.headers(),
        rows,
    }
}

/// Allocation columns plus each label in its own column.
///
/// There are as many label columns as the larger of the two doses; records
/// with fewer labels leave the trailing cells empty.
pub fn combined_view(
    records: &[AllocationRecord],
    design: &TrialDesign,
    schema: &ExportSchema,
) -> Table {
    let label_columns = Sex::ALL
        .iter()
        .map(|sex| design.dosing.units(*sex) as usize)
        .max()
        .unwrap_or(0);
    let rows = records
        .iter()
        .map(|record| {
            let arm_code = design.arms.code(record.arm);
            let mut row = vec![
                schema.sequence_id(record.sequence),
                record.site.to_string(),
                schema.sex_value(record.sex).to_string(),
                schema.arm_text(record.arm, &design.arms),
            ];
            row.extend((0..label_columns).map(|index| {
                record
                    .labels
                    .get(index)
                    .map(|label| design.labels.render(*label, record.site, arm_code))
                    .unwrap_or_default()
            }));
            row
        })
        .collect();
    Table {
        headers: schema.combined.headers(label_columns),
        rows,
    }
}

/// The record's labels in printed form, joined with the schema separator.
pub fn render_labels(record: &AllocationRecord, design: &TrialDesign, schema: &ExportSchema) -> String {
    let arm_code = design.arms.code(record.arm);
    record
        .labels
        .iter()
        .map(|label| design.labels.render(*label, record.site, arm_code))
        .collect::<Vec<_>>()
        .join(&schema.label_separator)
}
