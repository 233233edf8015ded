// crates/kelp-economics/src/emission.rs
//
// KELP emission schedule with halving.
//
// KelpFi uses a Bitcoin-like halving schedule, compressed for a farm:
// - Initial rate: 11.57 KELP per block (~1M KELP/day at 3s blocks)
// - Halving interval: 201,600 blocks (~7 days)
// - After 8 halvings (~56 days) emission halts entirely
//
// Halving is lazy: there is no scheduled "halve now" transition. The rate
// is a pure function of block height, and pool updates realize a boundary
// the next time they run across it.

use serde::{Deserialize, Serialize};

use kelp_core::types::{BlockNumber, Wei};

/// Default halving interval: 201,600 blocks is approximately 7 days at
/// 3 seconds per block.
pub const DEFAULT_HALVING_PERIOD_BLOCKS: u64 = 201_600;

/// Default number of halvings before emission halts: 8 (~56 days of
/// emissions in total).
pub const DEFAULT_MAX_HALVINGS: u64 = 8;

/// The emission schedule: per-block issuance as a pure function of block
/// height, plus exact totals over arbitrary block ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// Initial per-block issuance in wei.
    pub reward_per_block: Wei,
    /// First block that emits. Blocks before this contribute nothing.
    pub start_block: BlockNumber,
    /// Number of blocks between halvings.
    pub halving_period_blocks: u64,
    /// Emission halts once this many halving periods have fully elapsed.
    pub max_halvings: u64,
}

impl EmissionSchedule {
    /// Create a schedule. `halving_period_blocks` must be nonzero.
    pub fn new(
        reward_per_block: Wei,
        start_block: BlockNumber,
        halving_period_blocks: u64,
        max_halvings: u64,
    ) -> Self {
        assert!(halving_period_blocks > 0, "halving period must be nonzero");
        Self {
            reward_per_block,
            start_block,
            halving_period_blocks,
            max_halvings,
        }
    }

    /// Which halving epoch `block` falls in, clamped to `max_halvings`.
    /// Blocks before `start_block` are in epoch 0.
    pub fn epoch_index(&self, block: BlockNumber) -> u64 {
        if block < self.start_block {
            return 0;
        }
        let epoch = (block - self.start_block) / self.halving_period_blocks;
        epoch.min(self.max_halvings)
    }

    /// Per-block issuance (in wei) at `block`.
    ///
    /// The rate halves every `halving_period_blocks` and drops to zero once
    /// `max_halvings` periods have fully elapsed:
    ///   rate = reward_per_block >> epoch  for epoch < max_halvings
    ///   rate = 0                          otherwise
    pub fn reward_per_block_at(&self, block: BlockNumber) -> Wei {
        if block < self.start_block {
            return 0;
        }
        let epoch = (block - self.start_block) / self.halving_period_blocks;
        if epoch >= self.max_halvings || epoch >= 128 {
            return 0;
        }
        self.reward_per_block >> epoch
    }

    /// Total issuance (in wei) over the half-open block range `[from, to)`.
    ///
    /// Exact for ranges spanning any number of halving boundaries: the range
    /// is walked one epoch segment at a time (at most `max_halvings + 1`
    /// segments), summing `segment_blocks * rate(segment_start)` per
    /// segment. Blocks before `start_block` contribute zero. Pure function;
    /// degenerate ranges simply yield zero.
    pub fn total_reward(&self, from: BlockNumber, to: BlockNumber) -> Wei {
        let mut current = from.max(self.start_block);
        if to <= current {
            return 0;
        }

        let mut total: Wei = 0;
        while current < to {
            let epoch = (current - self.start_block) / self.halving_period_blocks;
            let rate = self.reward_per_block_at(current);
            if rate == 0 {
                // Past the final halving: nothing further ever accrues
                break;
            }
            let next_boundary = self
                .start_block
                .saturating_add((epoch + 1).saturating_mul(self.halving_period_blocks));
            let segment_end = to.min(next_boundary);
            let blocks_in_segment = (segment_end - current) as Wei;
            total = total.saturating_add(rate.saturating_mul(blocks_in_segment));
            current = segment_end;
        }

        total
    }
}
