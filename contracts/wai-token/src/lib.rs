//! WAI Share Token
//!
//! Fungible token representing shares of the basket.
//! Only the authorized minter (the vault account) can mint/burn.
//!
//! Holders move shares with `transfer`; the vault obtains a
//! [`MinterHandle`] through [`WaiToken::minter`], which checks the caller
//! once and then exposes the [`ShareToken`] interface.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use wai_common::{
    constants::{precision, token},
    errors::{WaiError, WaiResult},
    interfaces::ShareToken,
    types::{short_hex, Address, Amount},
};

// ============ Token State ============

/// WAI token state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct WaiTokenState {
    /// Authorized minter (vault account)
    pub authorized_minter: Address,
    /// Total supply tracking
    pub total_supply: Amount,
    /// Holder balances
    pub balances: BTreeMap<Address, Amount>,
}

// NOTE: Default is not implemented; a token always needs an explicit minter.

impl WaiTokenState {
    /// Create new token state with authorized minter
    pub fn new(authorized_minter: Address) -> Self {
        Self {
            authorized_minter,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }
}

// ============ Token ============

/// The basket share token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaiToken {
    state: WaiTokenState,
}

impl WaiToken {
    /// Create an empty token minted only by `authorized_minter`
    pub fn new(authorized_minter: Address) -> Self {
        Self {
            state: WaiTokenState::new(authorized_minter),
        }
    }

    /// Restore from persisted state
    pub fn from_state(state: WaiTokenState) -> Self {
        Self { state }
    }

    /// Current state
    pub fn state(&self) -> &WaiTokenState {
        &self.state
    }

    /// Get token name
    pub fn name() -> &'static str {
        token::NAME
    }

    /// Get token symbol
    pub fn symbol() -> &'static str {
        token::SYMBOL
    }

    /// Get token decimals
    pub fn decimals() -> u8 {
        token::DECIMALS
    }

    /// Account allowed to mint and burn
    pub fn authorized_minter(&self) -> &Address {
        &self.state.authorized_minter
    }

    /// Outstanding supply
    pub fn total_supply(&self) -> Amount {
        self.state.total_supply
    }

    /// Shares held by `account`
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.balances.get(account).copied().unwrap_or(0)
    }

    /// Move shares between holders, authorized by `from`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> WaiResult<()> {
        // 1. Amount must be positive
        if amount == 0 {
            return Err(WaiError::ZeroAmount);
        }

        // 2. Sender must have enough balance
        let available = self.balance_of(from);
        if available < amount {
            return Err(WaiError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        // 3. Recipient balance must not overflow before anything moves
        let recipient = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(WaiError::Overflow)?;

        self.set_balance(from, available - amount);
        self.set_balance(to, recipient);
        Ok(())
    }

    /// Borrow the token as its minter.
    ///
    /// Fails with `MintUnauthorized` unless `caller` is the authorized minter.
    pub fn minter(&mut self, caller: &Address) -> WaiResult<MinterHandle<'_>> {
        if *caller != self.state.authorized_minter {
            tracing::warn!(caller = %short_hex(caller), "rejecting unauthorized minter");
            return Err(WaiError::MintUnauthorized { caller: *caller });
        }
        Ok(MinterHandle { token: self })
    }

    fn set_balance(&mut self, account: &Address, amount: Amount) {
        if amount == 0 {
            self.state.balances.remove(account);
        } else {
            self.state.balances.insert(*account, amount);
        }
    }

    fn mint_to(&mut self, to: &Address, amount: Amount) -> WaiResult<()> {
        if amount == 0 {
            return Err(WaiError::ZeroAmount);
        }

        let new_supply = self
            .state
            .total_supply
            .checked_add(amount)
            .ok_or(WaiError::Overflow)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(WaiError::Overflow)?;

        self.state.total_supply = new_supply;
        self.set_balance(to, new_balance);

        tracing::debug!(to = %short_hex(to), amount, new_supply, "shares minted");
        Ok(())
    }

    fn burn_from(&mut self, from: &Address, amount: Amount) -> WaiResult<()> {
        if amount == 0 {
            return Err(WaiError::ZeroAmount);
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(WaiError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let new_supply = self
            .state
            .total_supply
            .checked_sub(amount)
            .ok_or(WaiError::Underflow)?;

        self.state.total_supply = new_supply;
        self.set_balance(from, available - amount);

        tracing::debug!(from = %short_hex(from), amount, new_supply, "shares burned");
        Ok(())
    }
}

// ============ Minter Handle ============

/// Mutable view of the token held by its authorized minter
#[derive(Debug)]
pub struct MinterHandle<'a> {
    token: &'a mut WaiToken,
}

impl ShareToken for MinterHandle<'_> {
    fn mint(&mut self, to: &Address, amount: Amount) -> WaiResult<()> {
        self.token.mint_to(to, amount)
    }

    fn burn(&mut self, from: &Address, amount: Amount) -> WaiResult<()> {
        self.token.burn_from(from, amount)
    }

    fn total_supply(&self) -> Amount {
        self.token.total_supply()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.token.balance_of(account)
    }
}

// ============ Helper Functions ============

/// Split an amount into whole and fractional parts for display
pub fn format_amount(amount: Amount) -> (Amount, Amount) {
    let whole = amount / precision::ONE;
    let fractional = amount % precision::ONE;
    (whole, fractional)
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VAULT: Address = [1u8; 32];
    const ALICE: Address = [2u8; 32];
    const BOB: Address = [3u8; 32];

    fn funded_token() -> WaiToken {
        let mut token = WaiToken::new(VAULT);
        token.minter(&VAULT).unwrap().mint(&ALICE, 1_000).unwrap();
        token
    }

    #[test]
    fn test_metadata() {
        assert_eq!(WaiToken::symbol(), "WAI");
        assert_eq!(WaiToken::decimals(), 18);
    }

    #[test]
    fn test_mint_authorized() {
        let token = funded_token();
        assert_eq!(token.total_supply(), 1_000);
        assert_eq!(token.balance_of(&ALICE), 1_000);
    }

    #[test]
    fn test_mint_unauthorized() {
        let mut token = WaiToken::new(VAULT);
        let attacker = [99u8; 32];

        let result = token.minter(&attacker);
        assert!(matches!(result, Err(WaiError::MintUnauthorized { caller }) if caller == attacker));
    }

    #[test]
    fn test_mint_zero_rejected() {
        let mut token = WaiToken::new(VAULT);
        let result = token.minter(&VAULT).unwrap().mint(&ALICE, 0);
        assert_eq!(result, Err(WaiError::ZeroAmount));
    }

    #[test]
    fn test_burn_success() {
        let mut token = funded_token();
        {
            let mut minter = token.minter(&VAULT).unwrap();
            minter.burn(&ALICE, 400).unwrap();
            assert_eq!(minter.total_supply(), 600);
        }
        assert_eq!(token.balance_of(&ALICE), 600);
    }

    #[test]
    fn test_burn_insufficient_balance() {
        let mut token = funded_token();
        let result = token.minter(&VAULT).unwrap().burn(&BOB, 1);
        assert_eq!(
            result,
            Err(WaiError::InsufficientBalance {
                available: 0,
                requested: 1
            })
        );
        assert_eq!(token.total_supply(), 1_000);
    }

    #[test]
    fn test_transfer_success() {
        let mut token = funded_token();
        token.transfer(&ALICE, &BOB, 600).unwrap();

        assert_eq!(token.balance_of(&ALICE), 400);
        assert_eq!(token.balance_of(&BOB), 600);
        assert_eq!(token.total_supply(), 1_000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = funded_token();
        let result = token.transfer(&BOB, &ALICE, 1);
        assert!(matches!(result, Err(WaiError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_format_amount() {
        let amount = 59_994 * precision::ONE / 100;
        assert_eq!(format_amount(amount), (599, 94 * precision::ONE / 100));
    }
}
