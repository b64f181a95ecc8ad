//! Label pool generation.
//!
//! Every (site, arm) pair gets a contiguous range of label numbers sized to
//! exactly what that site's sequence will dispense for the arm, permuted by
//! the random source. Ranges are laid out arm-major so that arm B always
//! starts after the last number used by arm A.

use std::collections::BTreeMap;
use std::ops::Range;

use rtsm_model::{Arm, ConfigError, Label, RandomizationError, SiteCode, TrialDesign};
use tracing::debug;

use crate::random::Shuffle;

/// Numbering of one (site, arm) pool, known before any random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPlan {
    pub site: SiteCode,
    pub arm: Arm,
    pub start: u32,
    pub count: u32,
}

impl PoolPlan {
    pub fn range(&self) -> Range<u64> {
        u64::from(self.start)..u64::from(self.start) + u64::from(self.count)
    }

    /// Highest label number in the pool, `None` for an empty pool.
    pub fn last(&self) -> Option<u32> {
        self.count.checked_sub(1).map(|offset| self.start + offset)
    }
}

/// Lay out label numbers for every (site, arm) pool of the design.
///
/// The returned order (arm A for every site, then arm B) is also the order
/// in which pools are generated and therefore part of the reproducibility
/// contract.
pub fn plan_pools(design: &TrialDesign) -> Result<Vec<PoolPlan>, ConfigError> {
    let mut plans = Vec::with_capacity(design.sites.len() * Arm::ALL.len());
    let mut next = u64::from(design.labels.first_number);
    let mut highest = None;
    for arm in Arm::ALL {
        for site in &design.sites {
            let required = design.dosing.labels_per_arm(site.quota);
            let count = u32::try_from(required).map_err(|_| ConfigError::InvalidPoolSize {
                site: site.code,
                arm,
                count: i64::try_from(required).unwrap_or(i64::MAX),
            })?;
            let end = next + u64::from(count);
            let overflow = ConfigError::LabelRangeOverflow {
                site: site.code,
                arm,
            };
            if end > u64::from(u32::MAX) + 1 {
                return Err(overflow);
            }
            let start = u32::try_from(next).map_err(|_| overflow)?;
            let plan = PoolPlan {
                site: site.code,
                arm,
                start,
                count,
            };
            if let Some(last) = plan.last() {
                highest = Some(last);
            }
            plans.push(plan);
            next = end;
        }
    }
    if let Some(highest) = highest {
        design.labels.check_width(highest)?;
    }
    Ok(plans)
}

/// Generate one shuffled pool `[start_offset, start_offset + count)`.
///
/// `count` is signed so that a negative size coming from a miscomputed
/// design is reported as a configuration error rather than wrapping.
pub fn generate_pool<S: Shuffle>(
    site: SiteCode,
    arm: Arm,
    start_offset: u32,
    count: i64,
    rng: &mut S,
) -> Result<LabelPool, ConfigError> {
    let size = u32::try_from(count).map_err(|_| ConfigError::InvalidPoolSize { site, arm, count })?;
    let end = u64::from(start_offset) + u64::from(size);
    if end > u64::from(u32::MAX) + 1 {
        return Err(ConfigError::LabelRangeOverflow { site, arm });
    }
    let mut labels: Vec<Label> = (0..size).map(|offset| Label(start_offset + offset)).collect();
    rng.shuffle(&mut labels);
    debug!(site = %site, arm = %arm, start = start_offset, count = size, "label pool generated");
    Ok(LabelPool::new(site, arm, labels))
}

/// A shuffled pool consumed front to back through a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPool {
    site: SiteCode,
    arm: Arm,
    labels: Vec<Label>,
    cursor: usize,
}

impl LabelPool {
    pub fn new(site: SiteCode, arm: Arm, labels: Vec<Label>) -> Self {
        Self {
            site,
            arm,
            labels,
            cursor: 0,
        }
    }

    pub fn site(&self) -> SiteCode {
        self.site
    }

    pub fn arm(&self) -> Arm {
        self.arm
    }

    /// All labels in pool order, consumed or not.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.labels.len() - self.cursor
    }

    pub fn is_drained(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` unconsumed labels.
    pub fn take(&mut self, n: usize) -> Result<&[Label], RandomizationError> {
        let available = self.remaining();
        if available < n {
            return Err(RandomizationError::InsufficientLabels {
                site: self.site,
                arm: self.arm,
                available,
                required: n,
            });
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.labels[start..self.cursor])
    }
}

/// All pools of a run, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSet {
    pools: Vec<LabelPool>,
}

impl PoolSet {
    /// Generate every planned pool, one shuffle per pool, in plan order.
    pub fn generate<S: Shuffle>(plans: &[PoolPlan], rng: &mut S) -> Result<Self, ConfigError> {
        let pools = plans
            .iter()
            .map(|plan| {
                generate_pool(
                    plan.site,
                    plan.arm,
                    plan.start,
                    i64::from(plan.count),
                    rng,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pools })
    }

    pub fn from_pools(pools: Vec<LabelPool>) -> Self {
        Self { pools }
    }

    pub fn get(&self, site: SiteCode, arm: Arm) -> Option<&LabelPool> {
        self.pools
            .iter()
            .find(|pool| pool.site == site && pool.arm == arm)
    }

    pub fn get_mut(&mut self, site: SiteCode, arm: Arm) -> Option<&mut LabelPool> {
        self.pools
            .iter_mut()
            .find(|pool| pool.site == site && pool.arm == arm)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelPool> {
        self.pools.iter()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Within an arm, no label number may appear in more than one pool or
    /// twice in the same pool.
    pub fn check_unique(&self) -> Result<(), RandomizationError> {
        for arm in Arm::ALL {
            let mut owners: BTreeMap<Label, SiteCode> = BTreeMap::new();
            for pool in self.pools.iter().filter(|pool| pool.arm == arm) {
                for label in &pool.labels {
                    if let Some(first_site) = owners.insert(*label, pool.site) {
                        return Err(RandomizationError::DuplicateLabel {
                            arm,
                            number: label.number(),
                            first_site,
                            second_site: pool.site,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Every pool must be fully consumed once assembly is over.
    pub fn check_drained(&self) -> Result<(), RandomizationError> {
        match self.pools.iter().find(|pool| !pool.is_drained()) {
            Some(pool) => Err(RandomizationError::UndrainedPool {
                site: pool.site,
                arm: pool.arm,
                remaining: pool.remaining(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{Identity, RandomSource};

    #[test]
    fn generate_pool_is_a_shuffled_range() {
        let mut rng = RandomSource::new(3);
        let pool = generate_pool(SiteCode(1), Arm::A, 10, 12, &mut rng).unwrap();
        let mut numbers: Vec<u32> = pool.labels().iter().map(|l| l.number()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (10..22).collect::<Vec<_>>());
        assert_eq!(rng.shuffle_count(), 1);
    }

    #[test]
    fn negative_count_is_a_config_error() {
        let error = generate_pool(SiteCode(1), Arm::B, 1, -3, &mut Identity).unwrap_err();
        assert_eq!(
            error,
            ConfigError::InvalidPoolSize {
                site: SiteCode(1),
                arm: Arm::B,
                count: -3
            }
        );
    }

    #[test]
    fn range_overflow_is_rejected() {
        let error = generate_pool(SiteCode(1), Arm::A, u32::MAX, 2, &mut Identity).unwrap_err();
        assert_eq!(
            error,
            ConfigError::LabelRangeOverflow {
                site: SiteCode(1),
                arm: Arm::A
            }
        );
        assert!(generate_pool(SiteCode(1), Arm::A, u32::MAX, 1, &mut Identity).is_ok());
    }

    #[test]
    fn take_advances_and_reports_exhaustion() {
        let mut pool = LabelPool::new(SiteCode(5), Arm::A, vec![Label(3), Label(1), Label(2)]);
        assert_eq!(pool.take(2).unwrap(), &[Label(3), Label(1)]);
        assert_eq!(pool.remaining(), 1);
        assert_eq!(
            pool.take(2),
            Err(RandomizationError::InsufficientLabels {
                site: SiteCode(5),
                arm: Arm::A,
                available: 1,
                required: 2
            })
        );
        assert_eq!(pool.take(1).unwrap(), &[Label(2)]);
        assert!(pool.is_drained());
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn duplicate_across_sites_is_detected() {
        let pools = PoolSet::from_pools(vec![
            LabelPool::new(SiteCode(1), Arm::A, vec![Label(1), Label(2)]),
            LabelPool::new(SiteCode(2), Arm::A, vec![Label(3), Label(2)]),
            LabelPool::new(SiteCode(1), Arm::B, vec![Label(1)]),
        ]);
        assert_eq!(
            pools.check_unique(),
            Err(RandomizationError::DuplicateLabel {
                arm: Arm::A,
                number: 2,
                first_site: SiteCode(1),
                second_site: SiteCode(2)
            })
        );
    }

    #[test]
    fn same_number_in_different_arms_is_allowed() {
        let pools = PoolSet::from_pools(vec![
            LabelPool::new(SiteCode(1), Arm::A, vec![Label(1)]),
            LabelPool::new(SiteCode(1), Arm::B, vec![Label(1)]),
        ]);
        assert!(pools.check_unique().is_ok());
    }
}
