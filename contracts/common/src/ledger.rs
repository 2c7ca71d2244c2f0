//! In-Memory Asset Ledger
//!
//! Reference `AssetLedger` holding per-asset balances and allowances,
//! with ERC20 semantics. Used to embed the vault in a single process and
//! as the deterministic ledger in tests.
//!
//! ## Semantics
//!
//! - **Transfers**: fail with `InsufficientBalance` and change nothing
//! - **Pulls**: consume allowance; fail with `InsufficientAllowance` first
//! - **Minting**: `mint` credits balances out of thin air (faucet / seeding)

use std::collections::BTreeMap;

use crate::errors::{WaiError, WaiResult};
use crate::interfaces::AssetLedger;
use crate::types::{short_hex, Address, Amount, AssetId};

/// Balance/allowance book for many assets
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    /// `(asset, account) -> balance`
    balances: BTreeMap<(AssetId, Address), Amount>,
    /// `(asset, owner, spender) -> allowance`
    allowances: BTreeMap<(AssetId, Address, Address), Amount>,
    /// `asset -> total issued`
    supplies: BTreeMap<AssetId, Amount>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `to`, growing its supply
    pub fn mint(&mut self, asset: &AssetId, to: &Address, amount: Amount) -> WaiResult<()> {
        let supply = self.supplies.entry(*asset).or_insert(0);
        *supply = supply.checked_add(amount).ok_or(WaiError::Overflow)?;
        let balance = self.balances.entry((*asset, *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(WaiError::Overflow)?;
        Ok(())
    }

    /// Let `spender` pull up to `amount` of `owner`'s `asset`
    pub fn approve(&mut self, asset: &AssetId, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*asset, *owner, *spender), amount);
    }

    /// Total issued of an asset
    pub fn total_supply(&self, asset: &AssetId) -> Amount {
        self.supplies.get(asset).copied().unwrap_or(0)
    }

    fn debit(&mut self, asset: &AssetId, from: &Address, amount: Amount) -> WaiResult<()> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(WaiError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances.insert((*asset, *from), available - amount);
        Ok(())
    }

    fn credit(&mut self, asset: &AssetId, to: &Address, amount: Amount) -> WaiResult<()> {
        let balance = self.balances.entry((*asset, *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(WaiError::Overflow)?;
        Ok(())
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Amount {
        self.balances.get(&(*asset, *account)).copied().unwrap_or(0)
    }

    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*asset, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, asset: &AssetId, from: &Address, to: &Address, amount: Amount) -> WaiResult<()> {
        if from == to {
            // Self-transfer: balance check only
            let available = self.balance_of(asset, from);
            if available < amount {
                return Err(WaiError::InsufficientBalance {
                    available,
                    requested: amount,
                });
            }
            return Ok(());
        }
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount)?;
        tracing::trace!(
            asset = %short_hex(asset),
            from = %short_hex(from),
            to = %short_hex(to),
            amount,
            "ledger transfer"
        );
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> WaiResult<()> {
        let allowed = self.allowance(asset, from, spender);
        if allowed < amount {
            return Err(WaiError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }
        self.transfer(asset, from, to, amount)?;
        self.allowances
            .insert((*asset, *from, *spender), allowed - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: AssetId = [9u8; 32];
    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];

    #[test]
    fn test_mint_and_transfer() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&ASSET, &ALICE, 1_000).unwrap();
        ledger.transfer(&ASSET, &ALICE, &BOB, 600).unwrap();

        assert_eq!(ledger.balance_of(&ASSET, &ALICE), 400);
        assert_eq!(ledger.balance_of(&ASSET, &BOB), 600);
        assert_eq!(ledger.total_supply(&ASSET), 1_000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&ASSET, &ALICE, 500).unwrap();

        let result = ledger.transfer(&ASSET, &ALICE, &BOB, 1_000);
        assert_eq!(
            result,
            Err(WaiError::InsufficientBalance {
                available: 500,
                requested: 1_000
            })
        );
        assert_eq!(ledger.balance_of(&ASSET, &ALICE), 500);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&ASSET, &ALICE, 1_000).unwrap();
        ledger.approve(&ASSET, &ALICE, &BOB, 700);

        ledger.transfer_from(&ASSET, &BOB, &ALICE, &BOB, 300).unwrap();
        assert_eq!(ledger.allowance(&ASSET, &ALICE, &BOB), 400);
        assert_eq!(ledger.balance_of(&ASSET, &BOB), 300);

        let result = ledger.transfer_from(&ASSET, &BOB, &ALICE, &BOB, 500);
        assert!(matches!(result, Err(WaiError::InsufficientAllowance { .. })));
    }

    #[test]
    fn test_transfer_from_without_balance_keeps_allowance() {
        let mut ledger = InMemoryLedger::new();
        ledger.approve(&ASSET, &ALICE, &BOB, u128::MAX);

        let result = ledger.transfer_from(&ASSET, &BOB, &ALICE, &BOB, 1);
        assert!(matches!(result, Err(WaiError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&ASSET, &ALICE, &BOB), u128::MAX);
    }
}
