//! Collaborator Interfaces
//!
//! The vault never owns balances, prices or share supply itself. It talks to
//! three collaborators through these traits, which keeps the engine
//! deterministic under test doubles.

use crate::errors::WaiResult;
use crate::types::{Address, Amount, AssetId, Price};

/// Source of 18-decimal asset prices
pub trait PriceOracle {
    /// Price of one whole unit of `asset`.
    ///
    /// Fails with `NoPriceAvailable` when the asset has no feed.
    fn get_price(&self, asset: &AssetId) -> WaiResult<Price>;
}

/// Multi-asset balance ledger (ERC20-like)
pub trait AssetLedger {
    /// Balance of `account` in `asset`
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Amount;

    /// Amount `spender` may pull from `owner`
    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` to `to`, authorized by `from`
    fn transfer(&mut self, asset: &AssetId, from: &Address, to: &Address, amount: Amount) -> WaiResult<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> WaiResult<()>;
}

/// Mintable/burnable share token
pub trait ShareToken {
    /// Issue `amount` new shares to `to`
    fn mint(&mut self, to: &Address, amount: Amount) -> WaiResult<()>;

    /// Destroy `amount` shares held by `from`
    fn burn(&mut self, from: &Address, amount: Amount) -> WaiResult<()>;

    /// Outstanding supply
    fn total_supply(&self) -> Amount;

    /// Shares held by `account`
    fn balance_of(&self, account: &Address) -> Amount;
}
