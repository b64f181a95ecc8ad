//! Allocation assembler: fuses each site's block sequence with its label
//! pools.
//!
//! The assembler takes ownership of the pools for their whole mutated
//! lifetime. Supply is checked per (site, arm) before a site consumes
//! anything, so an undersized pool fails the run up front instead of
//! halfway through a site.

use rtsm_model::{
    AllocationRecord, Arm, Cell, ConfigError, DosingRule, Label, RandomizationError, Result,
    SiteCode, SiteQuota, TrialDesign,
};
use tracing::{debug, info_span, trace};

use crate::blocks::build_site_sequence;
use crate::pool::{LabelPool, PoolSet};
use crate::random::Shuffle;

/// Assembled records plus the pools they were drawn from (all drained).
#[derive(Debug, Clone)]
pub struct Assembly {
    pub records: Vec<AllocationRecord>,
    pub pools: PoolSet,
}

struct PendingRecord {
    site: SiteCode,
    cell: Cell,
    labels: Vec<Label>,
}

/// Build every site's sequence in declared order and dispense labels from
/// the matching pools.
pub fn assemble<S: Shuffle>(design: &TrialDesign, mut pools: PoolSet, rng: &mut S) -> Result<Assembly> {
    let mut pending = Vec::with_capacity(design.total_quota as usize);

    for site in &design.sites {
        let span = info_span!("site", site = %site.code, quota = site.quota);
        let _guard = span.enter();

        let sequence = build_site_sequence(site, design.layout, design.block_size, rng)?;
        check_site_supply(site, &sequence, &design.dosing, &pools)?;

        for cell in sequence {
            let units = design.dosing.units(cell.sex) as usize;
            let pool = pools.get_mut(site.code, cell.arm).ok_or(
                RandomizationError::InsufficientLabels {
                    site: site.code,
                    arm: cell.arm,
                    available: 0,
                    required: units,
                },
            )?;
            let labels = pool.take(units)?.to_vec();
            pending.push(PendingRecord {
                site: site.code,
                cell,
                labels,
            });
        }
        debug!(records = site.quota, "site assembled");
    }

    pools.check_drained()?;

    let mut records = Vec::with_capacity(pending.len());
    let mut sequence = 0u32;
    for entry in pending {
        sequence += 1;
        trace!(
            sequence,
            site = %entry.site,
            cell = %entry.cell,
            labels = entry.labels.len(),
            "record assembled"
        );
        records.push(AllocationRecord {
            sequence,
            site: entry.site,
            sex: entry.cell.sex,
            arm: entry.cell.arm,
            labels: entry.labels,
        });
    }

    Ok(Assembly { records, pools })
}

/// Labels the sequence will dispense per arm must match what each pool holds.
fn check_site_supply(
    site: &SiteQuota,
    sequence: &[Cell],
    dosing: &DosingRule,
    pools: &PoolSet,
) -> Result<()> {
    for arm in Arm::ALL {
        let required: usize = sequence
            .iter()
            .filter(|cell| cell.arm == arm)
            .map(|cell| dosing.units(cell.sex) as usize)
            .sum();
        let available = pools.get(site.code, arm).map_or(0, LabelPool::remaining);
        if available < required {
            return Err(RandomizationError::InsufficientLabels {
                site: site.code,
                arm,
                available,
                required,
            });
        }
        if available > required {
            return Err(ConfigError::PoolSurplus {
                site: site.code,
                arm,
                available,
                required,
            }
            .into());
        }
    }
    Ok(())
}
