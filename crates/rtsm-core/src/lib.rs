//! Stratified permuted-block randomization with per-site, per-arm label
//! pools.
//!
//! [`randomize`] is the entry point. The submodules expose each stage so
//! that they can be exercised on their own.

pub mod assemble;
pub mod audit;
pub mod blocks;
pub mod pool;
pub mod random;
pub mod randomize;
pub mod verify;

pub use assemble::{Assembly, assemble};
pub use audit::{canonical_line, list_digest, sha256_hex};
pub use blocks::{build_nested_sequence, build_sequence, build_site_sequence};
pub use pool::{LabelPool, PoolPlan, PoolSet, generate_pool, plan_pools};
pub use random::{Identity, RandomSource, Shuffle};
pub use randomize::{Allocation, Randomization, allocate, randomize};
pub use verify::{BalanceReport, SiteBalance, verify_allocation};
