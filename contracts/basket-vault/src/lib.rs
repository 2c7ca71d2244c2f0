//! WAI Basket Vault
//!
//! Accounting engine for a multi-asset basket that mints and burns WAI
//! shares against supported collateral, valued through external prices
//! and held within per-asset ratio bounds.
//!
//! ## Core Operations
//!
//! - **mint_initial**: One-time conversion of seed collateral into shares
//! - **mint**: Deposit one or more assets, receive shares at the current price
//! - **burn**: Redeem shares pro rata across every held asset
//! - **support / enable / disable / change ratio**: Registry administration
//! - **remove_token**: Evacuate an asset into another at equal value
//!
//! ## Collaborators
//!
//! The engine holds no balances itself. Prices, collateral and shares live
//! behind the [`PriceOracle`], [`AssetLedger`] and [`ShareToken`] traits and
//! are handed to each call in a [`Collaborators`] bundle.
//!
//! ## Concurrency
//!
//! [`BasketState`] is a plain value owned by its caller. [`SharedVault`]
//! serializes every call behind one lock for hosts that run calls from
//! several threads.

use std::sync::Arc;

use parking_lot::Mutex;

pub mod admin;
pub mod processor;
pub mod registry;
pub mod valuation;


pub use admin::Removal;
pub use processor::{BurnReceipt, MintReceipt};
pub use registry::{AssetEntry, BasketState, RatioSums};
pub use valuation::{PriceCache, TokenRatioReport, ValuationSnapshot};

use wai_common::{
    config::VaultConfig,
    errors::WaiResult,
    events::{EventLog, WaiEvent},
    interfaces::{AssetLedger, PriceOracle, ShareToken},
    types::{Amount, AssetAmount, AssetId, CallContext, Price},
};

// ============ Collaborators ============

/// External services one call runs against
pub struct Collaborators<'a> {
    pub oracle: &'a dyn PriceOracle,
    pub ledger: &'a mut dyn AssetLedger,
    pub shares: &'a mut dyn ShareToken,
}

// ============ Vault ============

/// One basket and its event log
#[derive(Debug, Clone)]
pub struct Vault {
    state: BasketState,
    events: EventLog,
}

impl Vault {
    /// Create an uninitialized basket from a validated config
    pub fn new(config: &VaultConfig) -> WaiResult<Self> {
        Ok(Self::from_state(BasketState::new(config)?))
    }

    /// Resume from persisted state
    pub fn from_state(state: BasketState) -> Self {
        Self {
            state,
            events: EventLog::new(),
        }
    }

    pub fn state(&self) -> &BasketState {
        &self.state
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain the events emitted so far
    pub fn take_events(&mut self) -> Vec<WaiEvent> {
        std::mem::take(&mut self.events).into_events()
    }

    // ============ Registry ============

    pub fn support_token(
        &mut self,
        call: &CallContext,
        asset: AssetId,
        decimals: u8,
        min_ratio: u64,
        max_ratio: u64,
    ) -> WaiResult<()> {
        admin::support_token(
            &mut self.state,
            &mut self.events,
            call,
            asset,
            decimals,
            min_ratio,
            max_ratio,
        )
    }

    pub fn enable_token(&mut self, call: &CallContext, asset: &AssetId) -> WaiResult<()> {
        admin::enable_token(&mut self.state, &mut self.events, call, asset)
    }

    pub fn disable_token(&mut self, call: &CallContext, asset: &AssetId) -> WaiResult<()> {
        admin::disable_token(&mut self.state, &mut self.events, call, asset)
    }

    pub fn change_token_ratio(
        &mut self,
        call: &CallContext,
        asset: &AssetId,
        min_ratio: u64,
        max_ratio: u64,
    ) -> WaiResult<()> {
        admin::change_token_ratio(&mut self.state, &mut self.events, call, asset, min_ratio, max_ratio)
    }

    pub fn set_fee_ratio(&mut self, call: &CallContext, fee_mint_bps: u64, fee_burn_bps: u64) -> WaiResult<()> {
        admin::set_fee_ratio(&mut self.state, &mut self.events, call, fee_mint_bps, fee_burn_bps)
    }

    pub fn remove_token(
        &mut self,
        oracle: &dyn PriceOracle,
        ledger: &mut dyn AssetLedger,
        call: &CallContext,
        from_asset: &AssetId,
        to_asset: &AssetId,
    ) -> WaiResult<Removal> {
        admin::remove_token(
            &mut self.state,
            oracle,
            ledger,
            &mut self.events,
            call,
            from_asset,
            to_asset,
        )
    }

    // ============ Issuance ============

    pub fn mint_initial(
        &mut self,
        env: &mut Collaborators<'_>,
        call: &CallContext,
        target_price: Price,
    ) -> WaiResult<Amount> {
        processor::mint_initial(&mut self.state, env, &mut self.events, call, target_price)
    }

    pub fn mint(
        &mut self,
        env: &mut Collaborators<'_>,
        call: &CallContext,
        assets: &[AssetId],
        amounts: &[Amount],
        max_price: Price,
    ) -> WaiResult<MintReceipt> {
        processor::mint(&mut self.state, env, &mut self.events, call, assets, amounts, max_price)
    }

    pub fn burn(
        &mut self,
        env: &mut Collaborators<'_>,
        call: &CallContext,
        shares: Amount,
        min_price: Price,
    ) -> WaiResult<BurnReceipt> {
        processor::burn(&mut self.state, env, &mut self.events, call, shares, min_price)
    }

    // ============ Ledger Reconciliation ============

    pub fn verify_ledger_sync(&self, ledger: &dyn AssetLedger) -> WaiResult<Vec<AssetAmount>> {
        admin::verify_ledger_sync(&self.state, ledger)
    }

    pub fn sweep_surplus(
        &mut self,
        ledger: &mut dyn AssetLedger,
        call: &CallContext,
        asset: &AssetId,
    ) -> WaiResult<Amount> {
        admin::sweep_surplus(&self.state, ledger, &mut self.events, call, asset)
    }

    // ============ Queries ============

    pub fn get_current_token_ratio(&self, oracle: &dyn PriceOracle) -> WaiResult<TokenRatioReport> {
        valuation::current_token_ratio(&self.state, oracle)
    }

    pub fn get_price_per_share(&self, oracle: &dyn PriceOracle, shares: &dyn ShareToken) -> WaiResult<Price> {
        processor::get_price_per_share(&self.state, oracle, shares)
    }

    /// Tracked balance, 0 for unknown assets
    pub fn token_balance(&self, asset: &AssetId) -> Amount {
        self.state.token_balance(asset)
    }

    pub fn assets(&self) -> Vec<AssetId> {
        self.state.asset_ids()
    }

    pub fn fee_ratios(&self) -> (u64, u64) {
        self.state.fee_ratios()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }
}

// ============ Shared Handle ============

/// Thread-safe handle; every call holds the lock for its whole duration
#[derive(Debug, Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<Vault>>,
}

impl SharedVault {
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vault)),
        }
    }

    /// Run `f` with exclusive access to the vault
    pub fn with<R>(&self, f: impl FnOnce(&mut Vault) -> R) -> R {
        let mut vault = self.inner.lock();
        f(&mut vault)
    }

    /// Copy of the committed state
    pub fn state(&self) -> BasketState {
        self.inner.lock().state().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use wai_common::{
        constants::precision::ONE, errors::WaiError, events::EventType, ledger::InMemoryLedger,
        types::Address,
    };
    use wai_price_oracle::SimplePriceOracle;
    use wai_token::WaiToken;

    fn config() -> VaultConfig {
        VaultConfig::new([1u8; 32], [2u8; 32], [3u8; 32])
    }

    #[test]
    fn test_vault_rejects_invalid_config() {
        let config = VaultConfig::new([1u8; 32], [1u8; 32], [3u8; 32]);
        assert!(Vault::new(&config).is_err());
    }

    #[test]
    fn test_take_events_drains() {
        let mut vault = Vault::new(&config()).unwrap();
        let call = CallContext::new([9u8; 32], 10);
        vault.support_token(&call, [5u8; 32], 18, 0, 10_000).unwrap();

        assert_eq!(vault.take_events().len(), 1);
        assert!(vault.events().is_empty());
        assert_eq!(vault.assets(), vec![[5u8; 32]]);
    }

    #[test]
    fn test_shared_vault_serializes_writers() {
        let shared = SharedVault::new(Vault::new(&config()).unwrap());

        let handles: Vec<_> = (0u8..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let call = CallContext::new([9u8; 32], u64::from(i));
                    shared.with(|vault| vault.support_token(&call, [i + 100; 32], 8, 0, 5_000))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        let state = shared.state();
        assert_eq!(state.assets().len(), 8);
        assert_eq!(shared.with(|vault| vault.events().len()), 8);
    }

    #[test]
    fn test_shared_vault_serializes_mints_and_burns() {
        let vault_account: Address = [1u8; 32];
        let operator: Address = [9u8; 32];
        let alpha: AssetId = [0xa1; 32];
        let beta: AssetId = [0xb2; 32];

        let mut oracle = SimplePriceOracle::new(operator, operator);
        oracle.set_price(&operator, &alpha, ONE, 0).unwrap();
        oracle.set_price(&operator, &beta, 2 * ONE, 0).unwrap();

        let mut ledger = InMemoryLedger::new();
        let mut token = WaiToken::new(vault_account);
        let mut vault = Vault::new(&config()).unwrap();
        let setup = CallContext::new(operator, 1);
        vault.support_token(&setup, alpha, 18, 2_000, 8_000).unwrap();
        vault.support_token(&setup, beta, 18, 2_000, 8_000).unwrap();
        ledger.mint(&alpha, &vault_account, 10_000 * ONE).unwrap();
        ledger.mint(&beta, &vault_account, 5_000 * ONE).unwrap();

        let users: Vec<Address> = (0u8..4).map(|i| [0x60 + i; 32]).collect();
        for user in &users {
            for asset in [alpha, beta] {
                ledger.mint(&asset, user, 1_000 * ONE).unwrap();
                ledger.approve(&asset, user, &vault_account, Amount::MAX);
            }
        }
        {
            let mut minter = token.minter(&vault_account).unwrap();
            let mut env = Collaborators {
                oracle: &oracle,
                ledger: &mut ledger,
                shares: &mut minter,
            };
            vault.mint_initial(&mut env, &setup, ONE).unwrap();
        }

        let shared = SharedVault::new(vault);
        let oracle = Arc::new(oracle);
        let world = Arc::new(Mutex::new((ledger, token)));

        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let (shared, oracle, world, user) = (shared.clone(), oracle.clone(), world.clone(), *user);
                thread::spawn(move || -> WaiResult<()> {
                    for round in 0..5u64 {
                        let call = CallContext::new(user, 100 + round);
                        shared.with(|vault| {
                            let mut guard = world.lock();
                            let (ledger, token) = &mut *guard;
                            let mut minter = token.minter(&vault_account)?;
                            let mut env = Collaborators {
                                oracle: &*oracle,
                                ledger,
                                shares: &mut minter,
                            };
                            // Equal value on both legs keeps the basket at 50/50
                            let receipt =
                                vault.mint(&mut env, &call, &[alpha, beta], &[100 * ONE, 50 * ONE], Price::MAX)?;
                            vault.burn(&mut env, &call, receipt.net_shares / 2, 0)?;
                            Ok::<(), WaiError>(())
                        })?;
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        let state = shared.state();
        let guard = world.lock();
        let (ledger, token) = &*guard;
        assert!(shared.with(|vault| vault.verify_ledger_sync(ledger)).unwrap().is_empty());
        for asset in [alpha, beta] {
            assert_eq!(state.token_balance(&asset), ledger.balance_of(&asset, &vault_account));
        }

        let holders = users.iter().chain([[2u8; 32], [3u8; 32]].iter());
        let held: Amount = holders.map(|a| token.balance_of(a)).sum();
        assert_eq!(held, token.total_supply());

        shared.with(|vault| {
            assert_eq!(vault.events().filter_by_type(EventType::Minted).len(), 20);
            assert_eq!(vault.events().filter_by_type(EventType::Burned).len(), 20);
        });
    }
}
