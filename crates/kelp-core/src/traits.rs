// crates/kelp-core/src/traits.rs

use crate::error::KelpError;
use crate::types::{Address, BlockNumber, Wei};

/// Trait for fungible token contracts consumed by the Forest.
///
/// This is the standard transfer surface, rendered for an explicit-state
/// world: there is no ambient "message sender", so `from` and `spender` are
/// passed explicitly. Implementations must be all-or-nothing — a failed
/// transfer leaves every balance untouched.
///
/// Implemented by `KelpToken` in kelp-economics (which also serves as the
/// mock stake token in tests).
pub trait FungibleToken: Send + Sync {
    /// The token's own identity, used to key pools and detect duplicates.
    fn address(&self) -> Address;

    /// Current balance of `owner` in wei.
    fn balance_of(&self, owner: &Address) -> Wei;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Returns `KelpError::TransferFailed` if `from` holds less than `amount`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<(), KelpError>;

    /// Move `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// the spender's allowance.
    ///
    /// # Errors
    /// Returns `KelpError::InsufficientAllowance` if the approved allowance
    /// is below `amount`, or `KelpError::TransferFailed` if `owner` holds
    /// less than `amount`.
    fn transfer_from(
        &mut self,
        owner: &Address,
        spender: &Address,
        to: &Address,
        amount: Wei,
    ) -> Result<(), KelpError>;

    /// Set `spender`'s allowance over `owner`'s balance to `amount`.
    fn approve(&mut self, owner: &Address, spender: &Address, amount: Wei);
}

/// Trait for the external exchange used by the Treasury buyback.
///
/// Shaped after a Uniswap-V2-style router: a read-only quote plus an
/// exact-input swap along a token path. The engine treats the exchange as
/// an opaque collaborator; its internal swap mechanics are out of scope.
pub trait Exchange: Send + Sync {
    /// The exchange's identity; tokens sold into a swap settle here.
    fn address(&self) -> Address;

    /// Quote the output amount for swapping `amount_in` along `path`
    /// without executing anything.
    ///
    /// # Errors
    /// Returns `KelpError::ExchangeUnavailable` if no quote can be served
    /// for this path.
    fn quote(&self, amount_in: Wei, path: &[Address]) -> Result<Wei, KelpError>;

    /// Swap exactly `amount_in` of `path[0]` for at least `min_amount_out`
    /// of the final path token, delivered to `recipient`. The swap must not
    /// execute past `deadline_block`.
    ///
    /// # Errors
    /// Returns `KelpError::SlippageExceeded` if the realized output would be
    /// below `min_amount_out`, or `KelpError::ExchangeUnavailable` if the
    /// exchange rejects the call (including an expired deadline).
    fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: Wei,
        min_amount_out: Wei,
        path: &[Address],
        recipient: Address,
        deadline_block: BlockNumber,
    ) -> Result<Wei, KelpError>;
}
