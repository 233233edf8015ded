// crates/kelp-economics/src/token.rs
//
// KELP token: display/conversion wrapper, supply constants, and the
// capped fungible ledger with capability-gated minting.
//
// The smallest unit of KELP is the wei. 1 KELP = 10^18 wei. All internal
// accounting uses integer wei to avoid floating-point precision issues in
// economic calculations. Hard cap: 100,000,000 KELP.

use std::collections::HashMap;
use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

use kelp_core::error::KelpError;
use kelp_core::traits::FungibleToken;
use kelp_core::types::{Address, Wei};

/// Number of wei in one KELP. 1 KELP = 10^18 wei.
pub const WEI_PER_KELP: u128 = 1_000_000_000_000_000_000;

/// Maximum supply of KELP in wei. 100,000,000 KELP * 10^18 wei/KELP.
pub const MAX_SUPPLY_WEI: u128 = 100_000_000 * WEI_PER_KELP;

/// A KELP token amount.
///
/// Wraps an amount in wei (the smallest denomination). All arithmetic is
/// performed in integer wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Kelp {
    /// Amount in wei (1 KELP = 10^18 wei).
    pub wei: u128,
}

impl Kelp {
    /// Create a Kelp amount from a whole KELP value (as f64).
    ///
    /// Intended for configuration values like `11.57` KELP per block;
    /// not for exact accounting, which stays in integer wei.
    pub fn from_kelp(amount: f64) -> Self {
        Self {
            wei: (amount * WEI_PER_KELP as f64) as u128,
        }
    }

    /// Create a Kelp amount from a wei value.
    pub fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    /// Returns zero KELP.
    pub fn zero() -> Self {
        Self { wei: 0 }
    }
}

impl Sub for Kelp {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei.saturating_sub(rhs.wei),
        }
    }
}

impl fmt::Display for Kelp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_KELP;
        let frac = self.wei % WEI_PER_KELP;
        if frac == 0 {
            write!(f, "{} KELP", whole)
        } else {
            // Display up to 18 decimal places, trimming trailing zeros
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} KELP", whole, trimmed)
        }
    }
}

/// Capability granting the right to mint KELP.
///
/// Exactly one authority exists per token instance: `KelpToken::new` creates
/// it alongside the token and it is handed to the Forest at deployment.
/// It is deliberately not `Clone` and cannot be constructed elsewhere, so
/// mint rights can neither be duplicated nor reassigned at runtime.
#[derive(Debug)]
pub struct MintAuthority {
    token: Address,
}

/// The KELP fungible token ledger.
///
/// An in-memory balances/allowances ledger with a hard supply cap and
/// capability-gated issuance. Implements `FungibleToken`, so the same type
/// serves as the mock stake token in tests (the reference deployment does
/// the same with its token contract).
#[derive(Debug)]
pub struct KelpToken {
    address: Address,
    name: String,
    symbol: String,
    total_minted: Wei,
    balances: HashMap<Address, Wei>,
    allowances: HashMap<(Address, Address), Wei>,
}

impl KelpToken {
    /// Create a new KELP token ledger at `address`, returning the token
    /// together with its one and only mint authority.
    pub fn new(address: Address) -> (Self, MintAuthority) {
        let token = Self {
            address,
            name: "Kelp".to_string(),
            symbol: "KELP".to_string(),
            total_minted: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        };
        let authority = MintAuthority { token: address };
        (token, authority)
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Total wei minted over the token's lifetime. Never exceeds
    /// `MAX_SUPPLY_WEI`.
    pub fn total_minted(&self) -> Wei {
        self.total_minted
    }

    /// Wei still mintable before the supply cap is reached.
    pub fn remaining_supply(&self) -> Wei {
        MAX_SUPPLY_WEI - self.total_minted
    }

    /// Mint `amount` wei to `to`.
    ///
    /// # Errors
    /// Returns `KelpError::Unauthorized` if `authority` belongs to a
    /// different token instance, or `KelpError::SupplyCapExceeded` if the
    /// mint would push `total_minted` above `MAX_SUPPLY_WEI`.
    pub fn mint(
        &mut self,
        authority: &MintAuthority,
        to: &Address,
        amount: Wei,
    ) -> Result<(), KelpError> {
        if authority.token != self.address {
            return Err(KelpError::Unauthorized(
                "mint authority does not match this token".to_string(),
            ));
        }
        let new_total = self.total_minted.checked_add(amount).ok_or_else(|| {
            KelpError::InvalidState("total minted overflow".to_string())
        })?;
        if new_total > MAX_SUPPLY_WEI {
            return Err(KelpError::SupplyCapExceeded(format!(
                "minting {} wei would exceed the {} wei cap (minted so far: {})",
                amount, MAX_SUPPLY_WEI, self.total_minted
            )));
        }
        self.total_minted = new_total;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

impl FungibleToken for KelpToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> Wei {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<(), KelpError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(KelpError::TransferFailed(format!(
                "transfer of {} wei exceeds balance of {} wei",
                amount, from_balance
            )));
        }
        self.balances.insert(*from, from_balance - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        owner: &Address,
        spender: &Address,
        to: &Address,
        amount: Wei,
    ) -> Result<(), KelpError> {
        let allowance = self
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0);
        if allowance < amount {
            return Err(KelpError::InsufficientAllowance(format!(
                "spender approved for {} wei, needs {} wei",
                allowance, amount
            )));
        }
        self.transfer(owner, to, amount)?;
        self.allowances.insert((*owner, *spender), allowance - amount);
        Ok(())
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: Wei) {
        self.allowances.insert((*owner, *spender), amount);
    }
}
