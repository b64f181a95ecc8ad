//! Randomization run: the single entry point of the core.
//!
//! Stages, in the order they draw from the random source:
//! 1. **Validate**: the whole design, before any draw
//! 2. **Plan**: label numbering per (site, arm), arm-major
//! 3. **Pools**: one shuffle per pool in plan order, then the uniqueness check
//! 4. **Assemble**: per site in declared order, one shuffle per block
//! 5. **Verify**: re-check every balance and supply property on the records
//! 6. **Digest**: SHA-256 of the finished list

use rtsm_model::{AllocationRecord, Result, TrialDesign};
use tracing::{info, info_span};

use crate::assemble::{Assembly, assemble};
use crate::audit::list_digest;
use crate::pool::{PoolPlan, PoolSet, plan_pools};
use crate::random::{RandomSource, Shuffle};
use crate::verify::{BalanceReport, verify_allocation};

/// A verified allocation list.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub records: Vec<AllocationRecord>,
    pub pool_plan: Vec<PoolPlan>,
    pub balance: BalanceReport,
    pub digest: String,
}

/// A seeded run and its result.
#[derive(Debug, Clone)]
pub struct Randomization {
    pub seed: u64,
    pub shuffles: u64,
    pub allocation: Allocation,
}

/// Run the full randomization with the design's seed.
pub fn randomize(design: &TrialDesign) -> Result<Randomization> {
    let seed = design.require_seed()?;
    let span = info_span!(
        "randomize",
        seed,
        sites = design.sites.len(),
        total_quota = design.total_quota
    );
    let _guard = span.enter();

    let mut rng = RandomSource::new(seed);
    let allocation = allocate(design, &mut rng)?;
    info!(
        records = allocation.records.len(),
        shuffles = rng.shuffle_count(),
        digest = %allocation.digest,
        "randomization complete"
    );
    Ok(Randomization {
        seed,
        shuffles: rng.shuffle_count(),
        allocation,
    })
}

/// Run every stage with a caller-supplied shuffle source. The seed is not
/// consulted.
pub fn allocate<S: Shuffle>(design: &TrialDesign, rng: &mut S) -> Result<Allocation> {
    design.validate()?;

    let pool_plan = plan_pools(design)?;
    let pools = PoolSet::generate(&pool_plan, rng)?;
    pools.check_unique()?;
    info!(pools = pools.len(), "label pools generated");

    let Assembly { records, .. } = assemble(design, pools, rng)?;
    let balance = verify_allocation(design, &records)?;
    let digest = list_digest(&records);

    Ok(Allocation {
        records,
        pool_plan,
        balance,
        digest,
    })
}
