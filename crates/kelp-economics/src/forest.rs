// crates/kelp-economics/src/forest.rs
//
// The Kelp Forest: staking pools, reward accounting, and settlement.
//
// The Forest is the sole mutator of pool/user state and the sole holder of
// the KELP mint authority. Each pool tracks a cumulative
// reward-per-staked-unit accumulator (1e12 fixed point); each user record
// carries a reward debt snapshot so newly accrued reward is computed
// without iterating stakers. Emission follows the halving schedule lazily:
// the next update after a boundary apportions the straddling blocks
// exactly.
//
// Ordering invariant for every operation: the fallible external token pull
// runs before any settlement mutation, and reward payouts come out of the
// Forest's own custody balance, so a failure leaves user accounting
// untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use kelp_core::error::KelpError;
use kelp_core::traits::FungibleToken;
use kelp_core::types::{Address, BlockNumber, Wei};

use crate::config::LaunchConfig;
use crate::emission::EmissionSchedule;
use crate::token::{KelpToken, MintAuthority};
use crate::treasury::Treasury;

/// Fixed-point scale of the per-share reward accumulator: 1e12.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Basis-point denominator for fee math.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Default harvest fee routed to the treasury: 200 bps (2%).
pub const DEFAULT_HARVEST_FEE_BPS: u128 = 200;

/// Default dev-fund share minted on top of pool emission: 1000 bps (10%).
pub const DEFAULT_DEV_FEE_BPS: u128 = 1_000;

/// A user's position in one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStake {
    /// Currently staked balance of the pool's stake token.
    pub amount: Wei,
    /// Snapshot of `amount * acc_kelp_per_share / 1e12` at last settlement.
    /// Subtracting it from the current projection isolates newly accrued
    /// reward.
    pub reward_debt: Wei,
}

/// One staking pool: an independently weighted market for a single stake
/// token, earning `alloc_point / total_alloc_point` of global emission.
#[derive(Debug)]
pub struct Pool {
    /// The token users deposit. Distinct per pool.
    pub stake_token: Address,
    /// Relative emission weight among pools.
    pub alloc_point: u64,
    /// Last block at which this pool's accumulator was brought current.
    pub last_reward_block: BlockNumber,
    /// Cumulative reward per staked unit, 1e12 fixed point. Only increases.
    pub acc_kelp_per_share: u128,
    /// Sum of all user amounts in this pool.
    pub total_staked: Wei,
    users: HashMap<Address, UserStake>,
}

/// Multiply a stake amount by the per-share accumulator and scale down.
fn accrued(amount: Wei, acc_per_share: u128) -> Result<Wei, KelpError> {
    amount
        .checked_mul(acc_per_share)
        .map(|v| v / ACC_PRECISION)
        .ok_or_else(|| KelpError::InvalidState("reward accumulator overflow".to_string()))
}

/// The staking/accounting engine.
pub struct Forest {
    admin: Address,
    /// The Forest's own identity: custody address for staked principal and
    /// freshly minted KELP awaiting settlement.
    address: Address,
    treasury_address: Address,
    dev_fund: Option<Address>,
    harvest_fee_bps: u128,
    dev_fee_bps: u128,
    kelp: KelpToken,
    authority: MintAuthority,
    schedule: EmissionSchedule,
    pools: Vec<Pool>,
    total_alloc_point: u64,
}

impl Forest {
    /// Create a Forest holding the KELP ledger and its mint authority.
    ///
    /// The authority is consumed here and never leaves: mint rights belong
    /// to this Forest for the lifetime of the system.
    pub fn new(
        admin: Address,
        address: Address,
        treasury_address: Address,
        kelp: KelpToken,
        authority: MintAuthority,
        schedule: EmissionSchedule,
    ) -> Self {
        Self {
            admin,
            address,
            treasury_address,
            dev_fund: None,
            harvest_fee_bps: DEFAULT_HARVEST_FEE_BPS,
            dev_fee_bps: DEFAULT_DEV_FEE_BPS,
            kelp,
            authority,
            schedule,
            pools: Vec::new(),
            total_alloc_point: 0,
        }
    }

    /// Create a Forest from launch configuration, deployed at
    /// `current_block`. The emission schedule and both fee rates are taken
    /// from `config`.
    ///
    /// # Errors
    /// Returns `KelpError::InvalidState` if `config` fails
    /// [`LaunchConfig::validate`].
    pub fn from_config(
        admin: Address,
        address: Address,
        treasury_address: Address,
        kelp: KelpToken,
        authority: MintAuthority,
        config: &LaunchConfig,
        current_block: BlockNumber,
    ) -> Result<Self, KelpError> {
        let schedule = config.emission_schedule(current_block)?;
        Ok(
            Self::new(admin, address, treasury_address, kelp, authority, schedule)
                .with_harvest_fee(u128::from(config.harvest_fee_bps))
                .with_dev_fee(u128::from(config.dev_fee_bps)),
        )
    }

    /// Route a dev-fund share (minted on top of pool emission) to `dev_fund`.
    pub fn with_dev_fund(mut self, dev_fund: Address) -> Self {
        self.dev_fund = Some(dev_fund);
        self
    }

    /// Override the harvest fee (in bps) taken on every reward settlement.
    pub fn with_harvest_fee(mut self, bps: u128) -> Self {
        self.harvest_fee_bps = bps;
        self
    }

    /// Override the dev-fund share (in bps of pool emission).
    pub fn with_dev_fee(mut self, bps: u128) -> Self {
        self.dev_fee_bps = bps;
        self
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    /// Number of registered pools.
    pub fn pool_length(&self) -> usize {
        self.pools.len()
    }

    /// Sum of all pools' allocation points.
    pub fn total_alloc_point(&self) -> u64 {
        self.total_alloc_point
    }

    /// The Forest's custody address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Read access to the KELP ledger.
    pub fn kelp(&self) -> &KelpToken {
        &self.kelp
    }

    /// Mutable access to the KELP ledger (treasury buybacks move KELP out
    /// of treasury custody through this).
    pub fn kelp_mut(&mut self) -> &mut KelpToken {
        &mut self.kelp
    }

    /// Per-block emission rate at `block`, before pool weighting.
    pub fn reward_per_block_at(&self, block: BlockNumber) -> Wei {
        self.schedule.reward_per_block_at(block)
    }

    /// A pool by id.
    pub fn pool(&self, pool_id: usize) -> Result<&Pool, KelpError> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| KelpError::NotFound(format!("no pool with id {}", pool_id)))
    }

    /// A user's stake record in a pool. Users that never deposited read as
    /// an all-zero record.
    pub fn user_info(&self, pool_id: usize, who: &Address) -> Result<UserStake, KelpError> {
        let pool = self.pool(pool_id)?;
        Ok(pool.users.get(who).cloned().unwrap_or_default())
    }

    /// Project the reward a harvest at `current_block` would settle,
    /// without mutating anything. Matches a subsequent `harvest` bit for
    /// bit: same emission walk, same supply-cap clamp, same truncation.
    pub fn pending_kelp(
        &self,
        pool_id: usize,
        who: &Address,
        current_block: BlockNumber,
    ) -> Result<Wei, KelpError> {
        let pool = self.pool(pool_id)?;
        let user = match pool.users.get(who) {
            Some(user) => user,
            None => return Ok(0),
        };
        let mut acc = pool.acc_kelp_per_share;
        if current_block > pool.last_reward_block && pool.total_staked > 0 {
            let minted = self.projected_mint(pool, current_block)?;
            acc += minted
                .checked_mul(ACC_PRECISION)
                .ok_or_else(|| {
                    KelpError::InvalidState("reward accumulator overflow".to_string())
                })?
                / pool.total_staked;
        }
        Ok(accrued(user.amount, acc)?.saturating_sub(user.reward_debt))
    }

    /// The pool-share reward `update_pool` would mint for the stretch since
    /// `last_reward_block`, clamped to remaining supply.
    fn projected_mint(&self, pool: &Pool, current_block: BlockNumber) -> Result<Wei, KelpError> {
        if pool.alloc_point == 0 || self.total_alloc_point == 0 {
            return Ok(0);
        }
        let emitted = self
            .schedule
            .total_reward(pool.last_reward_block, current_block);
        let pool_reward = emitted
            .checked_mul(pool.alloc_point as u128)
            .ok_or_else(|| KelpError::InvalidState("pool reward overflow".to_string()))?
            / self.total_alloc_point as u128;
        Ok(pool_reward.min(self.kelp.remaining_supply()))
    }

    // ------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------

    fn require_admin(&self, caller: &Address) -> Result<(), KelpError> {
        if *caller != self.admin {
            return Err(KelpError::Unauthorized(
                "caller is not the forest admin".to_string(),
            ));
        }
        Ok(())
    }

    /// Register a new pool for `stake_token` with weight `alloc_point`.
    /// Admin only. Each stake token may back at most one pool.
    pub fn add_pool(
        &mut self,
        caller: &Address,
        alloc_point: u64,
        stake_token: Address,
        current_block: BlockNumber,
    ) -> Result<usize, KelpError> {
        self.require_admin(caller)?;
        if self.pools.iter().any(|p| p.stake_token == stake_token) {
            return Err(KelpError::DuplicateStakeToken(
                "a pool for this stake token already exists".to_string(),
            ));
        }
        self.total_alloc_point = self
            .total_alloc_point
            .checked_add(alloc_point)
            .ok_or_else(|| KelpError::InvalidState("total alloc point overflow".to_string()))?;
        let pool_id = self.pools.len();
        self.pools.push(Pool {
            stake_token,
            alloc_point,
            last_reward_block: current_block.max(self.schedule.start_block),
            acc_kelp_per_share: 0,
            total_staked: 0,
            users: HashMap::new(),
        });
        tracing::info!(pool_id, alloc_point, "pool added");
        Ok(pool_id)
    }

    /// Change a pool's allocation weight. Admin only. Setting 0 retires the
    /// pool from emission without removing it. All pools are updated first
    /// so emission already earned at the old weights stays settled.
    pub fn set_alloc_point(
        &mut self,
        caller: &Address,
        pool_id: usize,
        alloc_point: u64,
        current_block: BlockNumber,
    ) -> Result<(), KelpError> {
        self.require_admin(caller)?;
        if pool_id >= self.pools.len() {
            return Err(KelpError::NotFound(format!("no pool with id {}", pool_id)));
        }
        self.mass_update_pools(current_block)?;
        let old = self.pools[pool_id].alloc_point;
        self.total_alloc_point = self
            .total_alloc_point
            .checked_sub(old)
            .and_then(|t| t.checked_add(alloc_point))
            .ok_or_else(|| KelpError::InvalidState("total alloc point overflow".to_string()))?;
        self.pools[pool_id].alloc_point = alloc_point;
        tracing::info!(pool_id, old, new = alloc_point, "pool weight changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accumulator maintenance
    // ------------------------------------------------------------------

    /// Bring every pool's accumulator current.
    pub fn mass_update_pools(&mut self, current_block: BlockNumber) -> Result<(), KelpError> {
        for pool_id in 0..self.pools.len() {
            self.update_pool(pool_id, current_block)?;
        }
        Ok(())
    }

    /// Bring one pool's accumulator current. Idempotent: calling it twice
    /// in the same block changes nothing the second time.
    ///
    /// Emission for a stretch where the pool has no stake (or zero weight)
    /// is skipped, not deferred: `last_reward_block` advances and nothing
    /// is minted. That reward is forgone by policy — there is nobody to
    /// credit it to.
    pub fn update_pool(
        &mut self,
        pool_id: usize,
        current_block: BlockNumber,
    ) -> Result<(), KelpError> {
        if pool_id >= self.pools.len() {
            return Err(KelpError::NotFound(format!("no pool with id {}", pool_id)));
        }
        if current_block <= self.pools[pool_id].last_reward_block {
            return Ok(());
        }
        if self.pools[pool_id].total_staked == 0 {
            self.pools[pool_id].last_reward_block = current_block;
            return Ok(());
        }

        let minted = self.projected_mint(&self.pools[pool_id], current_block)?;
        if minted > 0 {
            let forest_address = self.address;
            self.kelp.mint(&self.authority, &forest_address, minted)?;

            let pool = &mut self.pools[pool_id];
            pool.acc_kelp_per_share += minted
                .checked_mul(ACC_PRECISION)
                .ok_or_else(|| {
                    KelpError::InvalidState("reward accumulator overflow".to_string())
                })?
                / pool.total_staked;

            // Dev-fund share is minted on top of pool emission, clamped to
            // whatever still fits under the cap.
            if let Some(dev_fund) = self.dev_fund {
                let dev_cut =
                    (minted * self.dev_fee_bps / BPS_DENOMINATOR).min(self.kelp.remaining_supply());
                if dev_cut > 0 {
                    self.kelp.mint(&self.authority, &dev_fund, dev_cut)?;
                }
            }

            if self.kelp.remaining_supply() == 0 {
                tracing::warn!(pool_id, "KELP supply cap reached; emission exhausted");
            }
        }

        self.pools[pool_id].last_reward_block = current_block;
        Ok(())
    }

    // ------------------------------------------------------------------
    // User operations
    // ------------------------------------------------------------------

    /// Deposit `amount` of the pool's stake token.
    ///
    /// Implicitly harvests: any pending reward is settled (fee included)
    /// before the stake is credited, keeping the reward-debt arithmetic
    /// exact. The principal pull is the only fallible external step and
    /// runs first; if it fails, no user accounting has changed.
    pub fn deposit(
        &mut self,
        pool_id: usize,
        who: &Address,
        amount: Wei,
        stake_token: &mut dyn FungibleToken,
        treasury: &mut Treasury,
        current_block: BlockNumber,
    ) -> Result<(), KelpError> {
        self.check_collaborators(pool_id, Some(&*stake_token), treasury)?;
        self.update_pool(pool_id, current_block)?;

        let forest_address = self.address;
        stake_token.transfer_from(who, &forest_address, &forest_address, amount)?;

        self.settle_pending(pool_id, who, treasury)?;

        let pool = &mut self.pools[pool_id];
        let user = pool.users.entry(*who).or_default();
        user.amount = user
            .amount
            .checked_add(amount)
            .ok_or_else(|| KelpError::InvalidState("stake amount overflow".to_string()))?;
        pool.total_staked = pool.total_staked.saturating_add(amount);
        user.reward_debt = accrued(user.amount, pool.acc_kelp_per_share)?;

        tracing::info!(pool_id, amount, "deposit");
        Ok(())
    }

    /// Withdraw `amount` of staked principal, settling pending reward
    /// along the way.
    ///
    /// As in [`Forest::deposit`], the principal transfer is the only
    /// fallible external step and runs before settlement; if it fails,
    /// no user accounting has changed.
    pub fn withdraw(
        &mut self,
        pool_id: usize,
        who: &Address,
        amount: Wei,
        stake_token: &mut dyn FungibleToken,
        treasury: &mut Treasury,
        current_block: BlockNumber,
    ) -> Result<(), KelpError> {
        self.check_collaborators(pool_id, Some(&*stake_token), treasury)?;
        let staked = self.user_info(pool_id, who)?.amount;
        if staked < amount {
            return Err(KelpError::InsufficientBalance(format!(
                "withdraw of {} wei exceeds staked balance of {} wei",
                amount, staked
            )));
        }

        self.update_pool(pool_id, current_block)?;

        let forest_address = self.address;
        stake_token.transfer(&forest_address, who, amount)?;

        self.settle_pending(pool_id, who, treasury)?;

        let pool = &mut self.pools[pool_id];
        let user = pool.users.entry(*who).or_default();
        user.amount -= amount;
        pool.total_staked = pool.total_staked.saturating_sub(amount);
        user.reward_debt = accrued(user.amount, pool.acc_kelp_per_share)?;

        tracing::info!(pool_id, amount, "withdraw");
        Ok(())
    }

    /// Settle pending reward without touching the stake. Returns the gross
    /// pending amount settled (fee included). Zero pending is a legal
    /// no-op, not an error.
    pub fn harvest(
        &mut self,
        pool_id: usize,
        who: &Address,
        treasury: &mut Treasury,
        current_block: BlockNumber,
    ) -> Result<Wei, KelpError> {
        self.check_collaborators(pool_id, None, treasury)?;
        self.update_pool(pool_id, current_block)?;
        let pending = self.settle_pending(pool_id, who, treasury)?;

        let pool = &mut self.pools[pool_id];
        if let Some(user) = pool.users.get_mut(who) {
            user.reward_debt = accrued(user.amount, pool.acc_kelp_per_share)?;
        }
        Ok(pending)
    }

    /// Circuit-breaker withdrawal: return the full staked principal and
    /// forfeit all pending reward. Skips `update_pool` and settlement
    /// entirely; the accumulator is untouched and the user record is
    /// zeroed, not deleted. Fund return takes priority over reward
    /// fairness here.
    pub fn emergency_withdraw(
        &mut self,
        pool_id: usize,
        who: &Address,
        stake_token: &mut dyn FungibleToken,
    ) -> Result<Wei, KelpError> {
        let pool = self.pool(pool_id)?;
        if stake_token.address() != pool.stake_token {
            return Err(KelpError::InvalidState(
                "token ledger does not match this pool's stake token".to_string(),
            ));
        }
        let amount = pool.users.get(who).map(|u| u.amount).unwrap_or(0);
        if amount == 0 {
            return Ok(0);
        }

        let forest_address = self.address;
        stake_token.transfer(&forest_address, who, amount)?;

        let pool = &mut self.pools[pool_id];
        pool.total_staked = pool.total_staked.saturating_sub(amount);
        pool.users.insert(*who, UserStake::default());

        tracing::warn!(pool_id, amount, "emergency withdraw; pending reward forfeited");
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_collaborators(
        &self,
        pool_id: usize,
        stake_token: Option<&dyn FungibleToken>,
        treasury: &Treasury,
    ) -> Result<(), KelpError> {
        let pool = self.pool(pool_id)?;
        if let Some(token) = stake_token {
            if token.address() != pool.stake_token {
                return Err(KelpError::InvalidState(
                    "token ledger does not match this pool's stake token".to_string(),
                ));
            }
        }
        if treasury.address() != self.treasury_address {
            return Err(KelpError::InvalidState(
                "treasury does not match the forest's configured treasury".to_string(),
            ));
        }
        Ok(())
    }

    /// Pay out a user's pending reward, net of the harvest fee, from the
    /// Forest's custody. Assumes the pool accumulator is already current.
    /// Returns the gross pending amount. Does not rebase reward debt; the
    /// caller does that after adjusting the stake.
    fn settle_pending(
        &mut self,
        pool_id: usize,
        who: &Address,
        treasury: &mut Treasury,
    ) -> Result<Wei, KelpError> {
        let (user_amount, reward_debt, acc) = {
            let pool = &self.pools[pool_id];
            match pool.users.get(who) {
                Some(user) => (user.amount, user.reward_debt, pool.acc_kelp_per_share),
                None => return Ok(0),
            }
        };

        let pending = accrued(user_amount, acc)?.saturating_sub(reward_debt);
        if pending == 0 {
            return Ok(0);
        }

        let fee = pending * self.harvest_fee_bps / BPS_DENOMINATOR;
        let payout = pending - fee;

        self.safe_kelp_transfer(who, payout)?;
        let treasury_address = self.treasury_address;
        let fee_paid = self.safe_kelp_transfer(&treasury_address, fee)?;
        treasury.receive_fee(fee_paid);

        tracing::info!(pool_id, pending, fee, "reward settled");
        Ok(pending)
    }

    /// Transfer KELP out of custody, clamped to the custody balance so a
    /// 1-wei rounding shortfall can never fail a settlement. Returns the
    /// amount actually moved.
    fn safe_kelp_transfer(&mut self, to: &Address, amount: Wei) -> Result<Wei, KelpError> {
        let custody = self.kelp.balance_of(&self.address);
        let amount = amount.min(custody);
        if amount > 0 {
            let forest_address = self.address;
            self.kelp.transfer(&forest_address, to, amount)?;
        }
        Ok(amount)
    }
}
