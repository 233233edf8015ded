// crates/kelp-economics/tests/forest_lifecycle.rs
//
// End-to-end lifecycle tests for the KelpFi reward engine: deposit,
// accrual across halving boundaries, harvest fee routing, emergency
// withdrawal, supply-cap exhaustion, and the treasury buyback loop.
//
// These drive the public APIs of kelp-economics the way a deployment
// would: one KELP ledger whose mint authority lives in the Forest, a mock
// stake token (the KelpToken type doubles as the mock, as in the reference
// deployment), and a mock router for the buyback leg.

use kelp_core::error::KelpError;
use kelp_core::traits::{Exchange, FungibleToken};
use kelp_core::types::{Address, BlockNumber, Wei};

use kelp_economics::emission::EmissionSchedule;
use kelp_economics::forest::{Forest, BPS_DENOMINATOR, DEFAULT_HARVEST_FEE_BPS};
use kelp_economics::token::{KelpToken, MAX_SUPPLY_WEI};
use kelp_economics::treasury::Treasury;

const ADMIN: Address = [0x01; 32];
const USER1: Address = [0x02; 32];
const USER2: Address = [0x03; 32];
const FOREST: Address = [0x10; 32];
const TREASURY: Address = [0x11; 32];
const KELP_ADDR: Address = [0xAA; 32];
const MOLT_ADDR: Address = [0xBB; 32];
const ROUTER: Address = [0xCC; 32];

const USER_FUNDS: Wei = 10_000;

/// Wire up the full deployment: KELP with its authority handed to the
/// Forest, a treasury, a funded mock MOLT, and one MOLT pool.
fn deploy(schedule: EmissionSchedule) -> (Forest, KelpToken, Treasury) {
    let (kelp, authority) = KelpToken::new(KELP_ADDR);
    let mut forest = Forest::new(ADMIN, FOREST, TREASURY, kelp, authority, schedule);
    let treasury = Treasury::new(TREASURY, KELP_ADDR, MOLT_ADDR);

    let (mut molt, molt_authority) = KelpToken::new(MOLT_ADDR);
    molt.mint(&molt_authority, &USER1, USER_FUNDS).unwrap();
    molt.mint(&molt_authority, &USER2, USER_FUNDS).unwrap();

    forest.add_pool(&ADMIN, 1_000, MOLT_ADDR, 0).unwrap();
    (forest, molt, treasury)
}

/// 10 wei per block from block 0, halving every 100 blocks, 8 halvings.
fn small_schedule() -> EmissionSchedule {
    EmissionSchedule::new(10, 0, 100, 8)
}

fn deposit(
    forest: &mut Forest,
    molt: &mut KelpToken,
    treasury: &mut Treasury,
    who: &Address,
    amount: Wei,
    block: BlockNumber,
) {
    molt.approve(who, &FOREST, amount);
    forest
        .deposit(0, who, amount, molt, treasury, block)
        .unwrap();
}

struct MockRouter {
    rate: Wei,
    swaps: usize,
}

impl Exchange for MockRouter {
    fn address(&self) -> Address {
        ROUTER
    }

    fn quote(&self, amount_in: Wei, _path: &[Address]) -> Result<Wei, KelpError> {
        Ok(amount_in * self.rate)
    }

    fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: Wei,
        min_amount_out: Wei,
        _path: &[Address],
        _recipient: Address,
        _deadline_block: BlockNumber,
    ) -> Result<Wei, KelpError> {
        let filled = amount_in * self.rate;
        assert!(filled >= min_amount_out);
        self.swaps += 1;
        Ok(filled)
    }
}

#[test]
fn test_one_pool_after_setup() {
    let (forest, _molt, _treasury) = deploy(small_schedule());
    assert_eq!(forest.pool_length(), 1);
    assert_eq!(forest.total_alloc_point(), 1_000);
}

#[test]
fn test_deposit_is_recorded() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    assert_eq!(forest.user_info(0, &USER1).unwrap().amount, 1_000);
}

#[test]
fn test_rewards_accrue_over_blocks() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    assert!(forest.pending_kelp(0, &USER1, 10).unwrap() > 0);
}

#[test]
fn test_withdraw_returns_principal_and_pays_kelp() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);

    forest
        .withdraw(0, &USER1, 1_000, &mut molt, &mut treasury, 5)
        .unwrap();

    assert_eq!(forest.user_info(0, &USER1).unwrap().amount, 0);
    assert_eq!(molt.balance_of(&USER1), USER_FUNDS);
    assert!(forest.kelp().balance_of(&USER1) > 0);
}

#[test]
fn test_earlier_depositor_earns_more() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    deposit(&mut forest, &mut molt, &mut treasury, &USER2, 1_000, 10);

    // Blocks 0-10: user1 alone earns 100. Blocks 10-20: 100 split evenly.
    let pending1 = forest.pending_kelp(0, &USER1, 20).unwrap();
    let pending2 = forest.pending_kelp(0, &USER2, 20).unwrap();
    assert_eq!(pending1, 150);
    assert_eq!(pending2, 50);
    assert!(pending1 > pending2);
}

#[test]
fn test_harvest_routes_fee_to_treasury() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);

    let before = forest.kelp().balance_of(&TREASURY);
    let pending = forest.harvest(0, &USER1, &mut treasury, 20).unwrap();
    let after = forest.kelp().balance_of(&TREASURY);

    let fee = pending * DEFAULT_HARVEST_FEE_BPS / BPS_DENOMINATOR;
    assert!(after > before);
    assert_eq!(after - before, fee);
    assert_eq!(treasury.pending_fee_balance(), fee);
    assert_eq!(forest.kelp().balance_of(&USER1), pending - fee);
}

#[test]
fn test_emergency_withdraw_forfeits_rewards() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);

    forest.emergency_withdraw(0, &USER1, &mut molt).unwrap();

    assert_eq!(molt.balance_of(&USER1), USER_FUNDS);
    assert_eq!(forest.kelp().balance_of(&USER1), 0);
}

#[test]
fn test_only_admin_can_add_pools() {
    let (mut forest, _molt, _treasury) = deploy(small_schedule());
    let result = forest.add_pool(&USER1, 100, [0xEE; 32], 0);
    assert!(matches!(result, Err(KelpError::Unauthorized(_))));
}

#[test]
fn test_rate_halves_after_halving_period() {
    let (forest, _molt, _treasury) = deploy(small_schedule());
    assert_eq!(forest.reward_per_block_at(99), 10);
    assert_eq!(forest.reward_per_block_at(100), 5);
    assert_eq!(forest.reward_per_block_at(250), 2);
}

#[test]
fn test_cross_epoch_accrual_is_exact() {
    // Single staker of 1000 from the start block; after 150 blocks the
    // pending reward spans one halving: 100*10 + 50*5 = 1250.
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    assert_eq!(forest.pending_kelp(0, &USER1, 150).unwrap(), 1_250);
}

#[test]
fn test_update_pool_idempotent_at_same_height() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);

    forest.update_pool(0, 42).unwrap();
    let minted = forest.kelp().total_minted();
    let acc = forest.pool(0).unwrap().acc_kelp_per_share;
    forest.update_pool(0, 42).unwrap();
    assert_eq!(forest.kelp().total_minted(), minted);
    assert_eq!(forest.pool(0).unwrap().acc_kelp_per_share, acc);
}

#[test]
fn test_custody_always_covers_pendings() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    deposit(&mut forest, &mut molt, &mut treasury, &USER2, 3_000, 7);
    forest.harvest(0, &USER1, &mut treasury, 31).unwrap();
    deposit(&mut forest, &mut molt, &mut treasury, &USER2, 1_000, 55);
    forest
        .withdraw(0, &USER1, 500, &mut molt, &mut treasury, 90)
        .unwrap();

    // Bring the accumulator current, then reconcile: everything minted for
    // this pool either left custody through settlement or is still backing
    // someone's pending balance (up to integer-truncation dust).
    forest.update_pool(0, 120).unwrap();
    let custody = forest.kelp().balance_of(&FOREST);
    let pending_total = forest.pending_kelp(0, &USER1, 120).unwrap()
        + forest.pending_kelp(0, &USER2, 120).unwrap();
    assert!(custody >= pending_total);
    assert!(custody - pending_total < 10);

    // Ledger-level conservation: every minted wei is somewhere.
    let minted = forest.kelp().total_minted();
    let held = forest.kelp().balance_of(&FOREST)
        + forest.kelp().balance_of(&USER1)
        + forest.kelp().balance_of(&USER2)
        + forest.kelp().balance_of(&TREASURY);
    assert_eq!(minted, held);
}

#[test]
fn test_supply_cap_stops_emission() {
    // Half the cap per block: the cap is hit during the second block of
    // accrual, and every update after that mints nothing.
    let schedule = EmissionSchedule::new(MAX_SUPPLY_WEI / 2, 0, 1_000_000, 1);
    let (mut forest, mut molt, mut treasury) = deploy(schedule);
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);

    forest.update_pool(0, 3).unwrap();
    assert_eq!(forest.kelp().total_minted(), MAX_SUPPLY_WEI);
    assert_eq!(forest.kelp().remaining_supply(), 0);

    let pending_at_cap = forest.pending_kelp(0, &USER1, 3).unwrap();
    forest.update_pool(0, 50).unwrap();
    assert_eq!(forest.kelp().total_minted(), MAX_SUPPLY_WEI);
    assert_eq!(forest.pending_kelp(0, &USER1, 50).unwrap(), pending_at_cap);
}

#[test]
fn test_fee_buyback_roundtrip() {
    let (mut forest, mut molt, mut treasury) = deploy(small_schedule());
    deposit(&mut forest, &mut molt, &mut treasury, &USER1, 1_000, 0);
    forest.harvest(0, &USER1, &mut treasury, 100).unwrap();

    let fee = treasury.pending_fee_balance();
    assert_eq!(fee, 20); // 2% of the 1000 settled

    let mut router = MockRouter { rate: 3, swaps: 0 };
    let record = treasury
        .execute_buyback(forest.kelp_mut(), &mut router, 101)
        .unwrap()
        .unwrap();

    assert_eq!(record.amount_in, fee);
    assert_eq!(record.amount_out, fee * 3);
    assert_eq!(treasury.pending_fee_balance(), 0);
    assert_eq!(router.swaps, 1);
    assert_eq!(forest.kelp().balance_of(&TREASURY), 0);
    assert_eq!(forest.kelp().balance_of(&ROUTER), fee);
    assert_eq!(treasury.buyback_history().len(), 1);
}
