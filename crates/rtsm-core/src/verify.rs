//! Post-assembly verification.
//!
//! Re-derives every balance and supply property from the finished records
//! alone. The assembler is built to satisfy all of them; a failure here
//! means the list must not be released.

use std::collections::{BTreeMap, BTreeSet};

use rtsm_model::{
    AllocationRecord, Arm, BlockLayout, Cell, Label, RandomizationError, Result, Sex, SiteCode,
    TrialDesign,
};
use tracing::debug;

/// Realized counts for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBalance {
    pub site: SiteCode,
    pub quota: u32,
    pub records: usize,
    pub blocks: usize,
    pub cells: BTreeMap<Cell, usize>,
    pub labels: BTreeMap<Arm, usize>,
}

impl SiteBalance {
    pub fn count(&self, sex: Sex, arm: Arm) -> usize {
        self.cells.get(&Cell::new(sex, arm)).copied().unwrap_or(0)
    }

    pub fn sex_total(&self, sex: Sex) -> usize {
        Arm::ALL.iter().map(|arm| self.count(sex, *arm)).sum()
    }

    pub fn arm_total(&self, arm: Arm) -> usize {
        Sex::ALL.iter().map(|sex| self.count(*sex, arm)).sum()
    }

    pub fn labels_dispensed(&self, arm: Arm) -> usize {
        self.labels.get(&arm).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub sites: Vec<SiteBalance>,
}

impl BalanceReport {
    pub fn total_records(&self) -> usize {
        self.sites.iter().map(|site| site.records).sum()
    }

    pub fn total_labels(&self, arm: Arm) -> usize {
        self.sites.iter().map(|site| site.labels_dispensed(arm)).sum()
    }
}

/// Check quota conservation, sex balance, block balance, dosing and label
/// uniqueness, and summarize the realized counts per site.
pub fn verify_allocation(design: &TrialDesign, records: &[AllocationRecord]) -> Result<BalanceReport> {
    check_sequence_numbers(records)?;

    let declared: BTreeSet<SiteCode> = design.site_codes().collect();
    if let Some(stray) = records.iter().find(|r| !declared.contains(&r.site)) {
        return Err(violation(stray.site, "record for an undeclared site"));
    }

    check_labels(design, records)?;

    let mut sites = Vec::with_capacity(design.sites.len());
    for site in &design.sites {
        let site_records: Vec<&AllocationRecord> =
            records.iter().filter(|r| r.site == site.code).collect();
        if site_records.len() != site.quota as usize {
            return Err(violation(
                site.code,
                format!(
                    "{} records emitted for a quota of {}",
                    site_records.len(),
                    site.quota
                ),
            ));
        }

        let mut cells: BTreeMap<Cell, usize> = BTreeMap::new();
        let mut labels: BTreeMap<Arm, usize> = BTreeMap::new();
        for record in &site_records {
            *cells.entry(record.cell()).or_insert(0) += 1;
            *labels.entry(record.arm).or_insert(0) += record.labels.len();
        }
        let half = site.quota as usize / 2;
        for sex in Sex::ALL {
            let count: usize = Arm::ALL
                .iter()
                .map(|arm| cells.get(&Cell::new(sex, *arm)).copied().unwrap_or(0))
                .sum();
            if count != half {
                return Err(violation(
                    site.code,
                    format!("{count} {sex} participants, expected {half}"),
                ));
            }
        }

        let sequence: Vec<Cell> = site_records.iter().map(|r| r.cell()).collect();
        let blocks = check_blocks(site.code, &sequence, design.layout, design.block_size)?;

        sites.push(SiteBalance {
            site: site.code,
            quota: site.quota,
            records: site_records.len(),
            blocks,
            cells,
            labels,
        });
    }

    debug!(sites = sites.len(), records = records.len(), "allocation verified");
    Ok(BalanceReport { sites })
}

fn check_sequence_numbers(records: &[AllocationRecord]) -> Result<()> {
    let mut expected = 1u32;
    for record in records {
        if record.sequence != expected {
            return Err(violation(
                record.site,
                format!(
                    "sequence number {} found where {expected} was expected",
                    record.sequence
                ),
            ));
        }
        expected += 1;
    }
    Ok(())
}

/// Dosing per record and global uniqueness per arm.
fn check_labels(design: &TrialDesign, records: &[AllocationRecord]) -> Result<()> {
    let mut issued: BTreeMap<(Arm, Label), SiteCode> = BTreeMap::new();
    for record in records {
        let expected = design.dosing.units(record.sex) as usize;
        if record.labels.len() != expected {
            return Err(violation(
                record.site,
                format!(
                    "record {} carries {} labels, {} participants receive {expected}",
                    record.sequence,
                    record.labels.len(),
                    record.sex
                ),
            ));
        }
        for label in &record.labels {
            if let Some(first_site) = issued.insert((record.arm, *label), record.site) {
                return Err(RandomizationError::DuplicateLabel {
                    arm: record.arm,
                    number: label.number(),
                    first_site,
                    second_site: record.site,
                });
            }
        }
    }
    Ok(())
}

/// Every consecutive block must hold its fixed composition. Returns the
/// number of blocks checked.
fn check_blocks(
    site: SiteCode,
    sequence: &[Cell],
    layout: BlockLayout,
    block_size: u32,
) -> Result<usize> {
    let size = block_size as usize;
    match layout {
        BlockLayout::Crossed => {
            let per_cell = size / Cell::ALL.len();
            for (index, block) in sequence.chunks(size).enumerate() {
                let balanced = block.len() == size
                    && Cell::ALL
                        .iter()
                        .all(|cell| block.iter().filter(|c| *c == cell).count() == per_cell);
                if !balanced {
                    return Err(violation(site, format!("block {} is unbalanced", index + 1)));
                }
            }
            Ok(sequence.len() / size)
        }
        BlockLayout::NestedBySex => {
            let per_arm = size / 2;
            let mut blocks = 0;
            for sex in Sex::ALL {
                let arms: Vec<Arm> = sequence
                    .iter()
                    .filter(|c| c.sex == sex)
                    .map(|c| c.arm)
                    .collect();
                for (index, block) in arms.chunks(size).enumerate() {
                    let balanced = block.len() == size
                        && Arm::ALL
                            .iter()
                            .all(|arm| block.iter().filter(|a| *a == arm).count() == per_arm);
                    if !balanced {
                        return Err(violation(
                            site,
                            format!("{sex} block {} is unbalanced", index + 1),
                        ));
                    }
                }
                blocks += arms.len() / size;
            }
            Ok(blocks)
        }
    }
}

fn violation(site: SiteCode, message: impl Into<String>) -> RandomizationError {
    RandomizationError::InvariantViolation {
        site,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtsm_model::{ArmSpec, SiteQuota, TrialArms};

    fn design() -> TrialDesign {
        TrialDesign::new(
            TrialArms::new(ArmSpec::new("A1"), ArmSpec::new("B1")),
            vec![SiteQuota::new(1, 4)],
        )
    }

    fn record(sequence: u32, sex: Sex, arm: Arm, labels: &[u32]) -> AllocationRecord {
        AllocationRecord {
            sequence,
            site: SiteCode(1),
            sex,
            arm,
            labels: labels.iter().copied().map(Label).collect(),
        }
    }

    fn valid() -> Vec<AllocationRecord> {
        vec![
            record(1, Sex::Female, Arm::B, &[6]),
            record(2, Sex::Male, Arm::A, &[2, 1]),
            record(3, Sex::Male, Arm::B, &[4, 5]),
            record(4, Sex::Female, Arm::A, &[3]),
        ]
    }

    #[test]
    fn valid_block_passes() {
        let report = verify_allocation(&design(), &valid()).unwrap();
        let site = &report.sites[0];
        assert_eq!(site.blocks, 1);
        assert_eq!(site.sex_total(Sex::Male), 2);
        assert_eq!(site.arm_total(Arm::A), 2);
        assert_eq!(site.labels_dispensed(Arm::A), 3);
        assert_eq!(report.total_labels(Arm::B), 3);
        assert_eq!(report.total_records(), 4);
    }

    #[test]
    fn repeated_label_is_reported() {
        let mut records = valid();
        records[3].labels = vec![Label(1)];
        assert_eq!(
            verify_allocation(&design(), &records),
            Err(RandomizationError::DuplicateLabel {
                arm: Arm::A,
                number: 1,
                first_site: SiteCode(1),
                second_site: SiteCode(1)
            })
        );
    }

    #[test]
    fn wrong_dose_is_reported() {
        let mut records = valid();
        records[1].labels.pop();
        assert!(matches!(
            verify_allocation(&design(), &records),
            Err(RandomizationError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn unbalanced_block_is_reported() {
        let mut records = valid();
        records[0].arm = Arm::A;
        records[0].labels = vec![Label(7)];
        let error = verify_allocation(&design(), &records).unwrap_err();
        assert_eq!(
            error,
            RandomizationError::InvariantViolation {
                site: SiteCode(1),
                message: "block 1 is unbalanced".to_string()
            }
        );
    }

    #[test]
    fn gaps_in_sequence_numbers_are_reported() {
        let mut records = valid();
        records[2].sequence = 9;
        assert!(matches!(
            verify_allocation(&design(), &records),
            Err(RandomizationError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn missing_records_break_quota() {
        let records = valid()[..3].to_vec();
        let error = verify_allocation(&design(), &records).unwrap_err();
        assert_eq!(
            error,
            RandomizationError::InvariantViolation {
                site: SiteCode(1),
                message: "3 records emitted for a quota of 4".to_string()
            }
        );
    }
}
