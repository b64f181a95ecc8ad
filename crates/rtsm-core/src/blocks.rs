//! Block permutation engine.
//!
//! A site's enrollment sequence is a concatenation of blocks. Each block
//! has a fixed composition and its internal order is shuffled on its own,
//! one shuffle call per block, so balance is restored at every block
//! boundary.

use rtsm_model::{Arm, BlockLayout, Cell, ConfigError, Sex, SiteQuota};

use crate::random::Shuffle;

/// Build a site's sequence according to the design layout.
pub fn build_site_sequence<S: Shuffle>(
    site: &SiteQuota,
    layout: BlockLayout,
    block_size: u32,
    rng: &mut S,
) -> Result<Vec<Cell>, ConfigError> {
    match layout {
        BlockLayout::Crossed => build_sequence(site, block_size, rng),
        BlockLayout::NestedBySex => build_nested_sequence(site, block_size, rng),
    }
}

/// Crossed layout: `quota / block_size` blocks, each holding
/// `block_size / 4` slots of every (sex, arm) cell.
pub fn build_sequence<S: Shuffle>(
    site: &SiteQuota,
    block_size: u32,
    rng: &mut S,
) -> Result<Vec<Cell>, ConfigError> {
    let cells = Cell::ALL.len() as u32;
    if block_size == 0 || block_size % cells != 0 {
        return Err(ConfigError::InvalidBlockSize {
            block_size,
            layout: BlockLayout::Crossed,
            reason: "must be a positive multiple of 4",
        });
    }
    if site.quota % block_size != 0 {
        return Err(ConfigError::QuotaNotDivisible {
            site: site.code,
            quota: site.quota,
            divisor: block_size,
        });
    }

    let mut sequence = Vec::with_capacity(site.quota as usize);
    for _ in 0..site.quota / block_size {
        let mut block: Vec<Cell> = Cell::ALL
            .iter()
            .copied()
            .cycle()
            .take(block_size as usize)
            .collect();
        rng.shuffle(&mut block);
        sequence.extend(block);
    }
    Ok(sequence)
}

/// Nested layout: each sex gets `quota / 2` slots built from arm-balanced
/// blocks of `block_size`. Males are listed first, then females.
pub fn build_nested_sequence<S: Shuffle>(
    site: &SiteQuota,
    block_size: u32,
    rng: &mut S,
) -> Result<Vec<Cell>, ConfigError> {
    if block_size == 0 || block_size % 2 != 0 {
        return Err(ConfigError::InvalidBlockSize {
            block_size,
            layout: BlockLayout::NestedBySex,
            reason: "must be a positive even number",
        });
    }
    let divisor = block_size
        .checked_mul(2)
        .ok_or(ConfigError::InvalidBlockSize {
            block_size,
            layout: BlockLayout::NestedBySex,
            reason: "too large",
        })?;
    let per_sex = site.quota / 2;
    if site.quota % 2 != 0 || per_sex % block_size != 0 {
        return Err(ConfigError::QuotaNotDivisible {
            site: site.code,
            quota: site.quota,
            divisor,
        });
    }

    let half = (block_size / 2) as usize;
    let mut sequence = Vec::with_capacity(site.quota as usize);
    for sex in Sex::ALL {
        for _ in 0..per_sex / block_size {
            let mut block: Vec<Arm> = std::iter::repeat_n(Arm::A, half)
                .chain(std::iter::repeat_n(Arm::B, half))
                .collect();
            rng.shuffle(&mut block);
            sequence.extend(block.into_iter().map(|arm| Cell::new(sex, arm)));
        }
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{Identity, RandomSource};

    #[test]
    fn identity_block_is_canonical() {
        let site = SiteQuota::new(1, 4);
        let sequence = build_sequence(&site, 4, &mut Identity).unwrap();
        assert_eq!(sequence, Cell::ALL.to_vec());
    }

    #[test]
    fn one_shuffle_per_block() {
        let site = SiteQuota::new(1, 16);
        let mut rng = RandomSource::new(9);
        let sequence = build_sequence(&site, 4, &mut rng).unwrap();
        assert_eq!(sequence.len(), 16);
        assert_eq!(rng.shuffle_count(), 4);
    }

    #[test]
    fn quota_six_is_rejected() {
        let site = SiteQuota::new(2, 6);
        let mut rng = RandomSource::new(1);
        assert_eq!(
            build_sequence(&site, 4, &mut rng),
            Err(ConfigError::QuotaNotDivisible {
                site: site.code,
                quota: 6,
                divisor: 4
            })
        );
        assert_eq!(rng.shuffle_count(), 0);
    }

    #[test]
    fn larger_blocks_repeat_each_cell() {
        let site = SiteQuota::new(1, 8);
        let sequence = build_sequence(&site, 8, &mut RandomSource::new(5)).unwrap();
        for cell in Cell::ALL {
            assert_eq!(sequence.iter().filter(|c| **c == cell).count(), 2);
        }
    }

    #[test]
    fn nested_lists_males_first() {
        let site = SiteQuota::new(1, 16);
        let mut rng = RandomSource::new(11);
        let sequence = build_nested_sequence(&site, 4, &mut rng).unwrap();
        assert_eq!(rng.shuffle_count(), 4);
        assert!(sequence[..8].iter().all(|c| c.sex == Sex::Male));
        assert!(sequence[8..].iter().all(|c| c.sex == Sex::Female));
        for chunk in sequence.chunks(4) {
            assert_eq!(chunk.iter().filter(|c| c.arm == Arm::A).count(), 2);
        }
    }

    #[test]
    fn nested_rejects_partial_blocks() {
        let site = SiteQuota::new(3, 12);
        assert_eq!(
            build_nested_sequence(&site, 4, &mut Identity),
            Err(ConfigError::QuotaNotDivisible {
                site: site.code,
                quota: 12,
                divisor: 8
            })
        );
    }

    #[test]
    fn nested_rejects_block_size_whose_double_overflows() {
        let site = SiteQuota::new(1, 4);
        assert_eq!(
            build_nested_sequence(&site, 2_147_483_650, &mut Identity),
            Err(ConfigError::InvalidBlockSize {
                block_size: 2_147_483_650,
                layout: BlockLayout::NestedBySex,
                reason: "too large"
            })
        );
    }
}
