// crates/kelp-economics/src/config.rs
//
// Deployment-time configuration for the KelpFi reward engine.
// Loaded from a TOML file or populated with the launch defaults
// (~1M KELP/day at 3s blocks, weekly halvings, 8 halvings total).
// Consumed once at construction; none of this is runtime state.

use serde::Deserialize;
use std::fs;

use kelp_core::error::KelpError;
use kelp_core::types::BlockNumber;

use crate::emission::{
    EmissionSchedule, DEFAULT_HALVING_PERIOD_BLOCKS, DEFAULT_MAX_HALVINGS,
};
use crate::token::Kelp;

/// Launch parameters for the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchConfig {
    /// Initial emission in whole KELP per block.
    /// 1,000,000 KELP/day at ~86,400 blocks/day is about 11.57.
    #[serde(default = "default_kelp_per_block")]
    pub kelp_per_block: f64,

    /// Blocks between deployment and the first emitting block (~5 minutes).
    #[serde(default = "default_start_block_offset")]
    pub start_block_offset: u64,

    /// Blocks between halvings (~7 days).
    #[serde(default = "default_halving_period_blocks")]
    pub halving_period_blocks: u64,

    /// Halvings before emission halts (~56 days of emissions in total).
    #[serde(default = "default_max_halvings")]
    pub max_halvings: u64,

    /// Harvest fee routed to the treasury, in bps.
    #[serde(default = "default_harvest_fee_bps")]
    pub harvest_fee_bps: u64,

    /// Dev-fund share minted on top of pool emission, in bps.
    #[serde(default = "default_dev_fee_bps")]
    pub dev_fee_bps: u64,

    /// Slippage tolerance for treasury buyback swaps, in bps.
    #[serde(default = "default_buyback_slippage_bps")]
    pub buyback_slippage_bps: u64,
}

fn default_kelp_per_block() -> f64 {
    11.57
}

fn default_start_block_offset() -> u64 {
    100
}

fn default_halving_period_blocks() -> u64 {
    DEFAULT_HALVING_PERIOD_BLOCKS
}

fn default_max_halvings() -> u64 {
    DEFAULT_MAX_HALVINGS
}

fn default_harvest_fee_bps() -> u64 {
    200
}

fn default_dev_fee_bps() -> u64 {
    1_000
}

fn default_buyback_slippage_bps() -> u64 {
    300
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            kelp_per_block: default_kelp_per_block(),
            start_block_offset: default_start_block_offset(),
            halving_period_blocks: default_halving_period_blocks(),
            max_halvings: default_max_halvings(),
            harvest_fee_bps: default_harvest_fee_bps(),
            dev_fee_bps: default_dev_fee_bps(),
            buyback_slippage_bps: default_buyback_slippage_bps(),
        }
    }
}

impl LaunchConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// # Errors
    /// Returns `KelpError::Serialization` if the file cannot be read or
    /// parsed.
    pub fn load(path: &str) -> Result<Self, KelpError> {
        let contents =
            fs::read_to_string(path).map_err(|e| KelpError::Serialization(e.to_string()))?;
        let config: LaunchConfig =
            toml::from_str(&contents).map_err(|e| KelpError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter values the engine cannot run with.
    ///
    /// # Errors
    /// Returns `KelpError::InvalidState` if the halving period is zero, the
    /// per-block emission is not a finite non-negative number, or a fee
    /// exceeds 10,000 bps.
    pub fn validate(&self) -> Result<(), KelpError> {
        if self.halving_period_blocks == 0 {
            return Err(KelpError::InvalidState(
                "halving_period_blocks must be nonzero".to_string(),
            ));
        }
        if !self.kelp_per_block.is_finite() || self.kelp_per_block < 0.0 {
            return Err(KelpError::InvalidState(format!(
                "kelp_per_block {} is not a finite non-negative number",
                self.kelp_per_block
            )));
        }
        if self.harvest_fee_bps > 10_000 || self.dev_fee_bps > 10_000 {
            return Err(KelpError::InvalidState(format!(
                "fee bps out of range: harvest {}, dev {} (max 10000)",
                self.harvest_fee_bps, self.dev_fee_bps
            )));
        }
        Ok(())
    }

    /// Build the emission schedule for a deployment happening at
    /// `current_block`.
    ///
    /// # Errors
    /// Returns `KelpError::InvalidState` if the configuration fails
    /// [`LaunchConfig::validate`].
    pub fn emission_schedule(
        &self,
        current_block: BlockNumber,
    ) -> Result<EmissionSchedule, KelpError> {
        self.validate()?;
        Ok(EmissionSchedule::new(
            Kelp::from_kelp(self.kelp_per_block).wei,
            current_block + self.start_block_offset,
            self.halving_period_blocks,
            self.max_halvings,
        ))
    }
}
