// crates/kelp-economics/src/treasury.rs
//
// KelpFi treasury: harvest-fee sink and MOLT buyback executor.
//
// The Forest routes a slice of every harvest (in KELP) here. Anyone may
// trigger a buyback, which sells the full pending fee balance for the
// partner token ($MOLT) through the external exchange, creating continuous
// buy pressure. The fee balance is only zeroed after the exchange reports
// success, so a reverted swap leaves the ledger exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kelp_core::error::KelpError;
use kelp_core::traits::Exchange;
use kelp_core::types::{Address, BlockNumber, Wei};

use crate::config::LaunchConfig;
use crate::forest::BPS_DENOMINATOR;
use crate::token::KelpToken;

/// Default slippage tolerance for buyback swaps: 300 bps (3%).
pub const DEFAULT_SLIPPAGE_BPS: u128 = 300;

/// Blocks a submitted swap stays valid: ~5 minutes at 3s blocks.
pub const SWAP_DEADLINE_BLOCKS: u64 = 100;

/// One executed buyback. Append-only and informational; not load-bearing
/// for accounting correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuybackRecord {
    /// Block at which the swap executed.
    pub block: BlockNumber,
    /// Wall-clock time the record was written.
    pub executed_at: DateTime<Utc>,
    /// KELP sold, in wei.
    pub amount_in: Wei,
    /// Partner token received, in its smallest unit.
    pub amount_out: Wei,
    /// Reference id for the swap transaction.
    pub tx_ref: Uuid,
}

/// The KelpFi treasury.
///
/// Tracks the KELP fee balance awaiting conversion and the history of
/// completed buybacks. Fee deposits come exclusively from the Forest
/// during reward settlement.
pub struct Treasury {
    address: Address,
    kelp: Address,
    partner: Address,
    slippage_bps: u128,
    pending_fee_balance: Wei,
    buyback_history: Vec<BuybackRecord>,
}

impl Treasury {
    /// Create a treasury for buying `partner` with KELP fees.
    pub fn new(address: Address, kelp: Address, partner: Address) -> Self {
        Self {
            address,
            kelp,
            partner,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            pending_fee_balance: 0,
            buyback_history: Vec::new(),
        }
    }

    /// Create a treasury with the buyback slippage tolerance from `config`.
    pub fn from_config(
        address: Address,
        kelp: Address,
        partner: Address,
        config: &LaunchConfig,
    ) -> Self {
        Self::new(address, kelp, partner).with_slippage(u128::from(config.buyback_slippage_bps))
    }

    /// Override the slippage tolerance (in bps) applied to buyback swaps.
    pub fn with_slippage(mut self, slippage_bps: u128) -> Self {
        self.slippage_bps = slippage_bps.min(BPS_DENOMINATOR);
        self
    }

    /// The treasury's own address (KELP custody and swap recipient).
    pub fn address(&self) -> Address {
        self.address
    }

    /// KELP fees (in wei) collected and not yet converted.
    pub fn pending_fee_balance(&self) -> Wei {
        self.pending_fee_balance
    }

    /// Completed buybacks, oldest first.
    pub fn buyback_history(&self) -> &[BuybackRecord] {
        &self.buyback_history
    }

    /// Record an incoming harvest fee. Called only by the Forest during
    /// settlement; the matching KELP transfer happens on the token ledger.
    pub fn receive_fee(&mut self, amount: Wei) {
        self.pending_fee_balance = self.pending_fee_balance.saturating_add(amount);
    }

    /// Convert the full pending fee balance into the partner token.
    ///
    /// Callable by anyone. A zero pending balance is a legal no-op and
    /// returns `Ok(None)`. Otherwise the exchange is quoted, a minimum
    /// output is derived from the slippage tolerance, and the swap is
    /// attempted. Only after the swap succeeds are the KELP moved out, the
    /// fee balance zeroed, and the history appended — a failed swap leaves
    /// all treasury state untouched.
    ///
    /// # Errors
    /// Propagates `KelpError::ExchangeUnavailable` or
    /// `KelpError::SlippageExceeded` from the exchange. Returns
    /// `KelpError::InvalidState` if `kelp` is not the token this treasury
    /// was configured for.
    pub fn execute_buyback(
        &mut self,
        kelp: &mut KelpToken,
        exchange: &mut dyn Exchange,
        current_block: BlockNumber,
    ) -> Result<Option<BuybackRecord>, KelpError> {
        use kelp_core::traits::FungibleToken;

        if kelp.address() != self.kelp {
            return Err(KelpError::InvalidState(
                "token ledger does not match the treasury's reward token".to_string(),
            ));
        }

        let amount_in = self.pending_fee_balance;
        if amount_in == 0 {
            return Ok(None);
        }

        let path = [self.kelp, self.partner];
        let quoted = exchange.quote(amount_in, &path)?;
        let min_amount_out = quoted
            .saturating_mul(BPS_DENOMINATOR - self.slippage_bps)
            / BPS_DENOMINATOR;

        let amount_out = exchange.swap_exact_tokens_for_tokens(
            amount_in,
            min_amount_out,
            &path,
            self.address,
            current_block + SWAP_DEADLINE_BLOCKS,
        )?;

        // Swap succeeded: commit. Settle the KELP leg, release the reserved
        // fee balance, and record the buyback.
        kelp.transfer(&self.address, &exchange.address(), amount_in)?;
        self.pending_fee_balance = 0;

        let record = BuybackRecord {
            block: current_block,
            executed_at: Utc::now(),
            amount_in,
            amount_out,
            tx_ref: Uuid::now_v7(),
        };
        self.buyback_history.push(record.clone());

        tracing::info!(
            amount_in,
            amount_out,
            block = current_block,
            "treasury buyback executed"
        );

        Ok(Some(record))
    }
}
