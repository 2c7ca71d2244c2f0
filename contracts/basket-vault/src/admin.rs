//! Administrative Operations
//!
//! Registry changes (support, enable, disable, ratio bounds, fees), token
//! removal and ledger reconciliation. Who may call these is decided by the
//! caller-authorization layer in front of the vault.

use wai_common::{
    errors::{WaiError, WaiResult},
    events::{EventLog, WaiEvent},
    interfaces::{AssetLedger, PriceOracle},
    math::{asset_value, quantity_for_value},
    types::{short_hex, Amount, AssetAmount, AssetId, CallContext},
};

use crate::processor::{desync, preflight_pull};
use crate::registry::BasketState;
use crate::valuation::PriceCache;

// ============ Registry Changes ============

/// Add an asset to the basket, enabled, with a zero tracked balance
#[allow(clippy::too_many_arguments)]
pub fn support_token(
    state: &mut BasketState,
    events: &mut EventLog,
    call: &CallContext,
    asset: AssetId,
    decimals: u8,
    min_ratio: u64,
    max_ratio: u64,
) -> WaiResult<()> {
    state.insert_asset(asset, decimals, min_ratio, max_ratio)?;

    events.emit(WaiEvent::TokenSupported {
        asset,
        decimals,
        min_ratio,
        max_ratio,
        timestamp: call.timestamp,
    });
    tracing::info!(asset = %short_hex(&asset), decimals, min_ratio, max_ratio, "token supported");
    Ok(())
}

/// Accept deposits of an asset again
pub fn enable_token(
    state: &mut BasketState,
    events: &mut EventLog,
    call: &CallContext,
    asset: &AssetId,
) -> WaiResult<()> {
    state.set_enabled(asset, true)?;
    events.emit(WaiEvent::TokenEnabled {
        asset: *asset,
        timestamp: call.timestamp,
    });
    tracing::info!(asset = %short_hex(asset), "token enabled");
    Ok(())
}

/// Stop accepting deposits of an asset. Its balance stays redeemable.
pub fn disable_token(
    state: &mut BasketState,
    events: &mut EventLog,
    call: &CallContext,
    asset: &AssetId,
) -> WaiResult<()> {
    state.set_enabled(asset, false)?;
    events.emit(WaiEvent::TokenDisabled {
        asset: *asset,
        timestamp: call.timestamp,
    });
    tracing::info!(asset = %short_hex(asset), "token disabled");
    Ok(())
}

pub fn change_token_ratio(
    state: &mut BasketState,
    events: &mut EventLog,
    call: &CallContext,
    asset: &AssetId,
    min_ratio: u64,
    max_ratio: u64,
) -> WaiResult<()> {
    let (old_min_ratio, old_max_ratio) = state.set_ratio_bounds(asset, min_ratio, max_ratio)?;

    events.emit(WaiEvent::TokenRatioChanged {
        asset: *asset,
        old_min_ratio,
        old_max_ratio,
        new_min_ratio: min_ratio,
        new_max_ratio: max_ratio,
        timestamp: call.timestamp,
    });
    tracing::info!(
        asset = %short_hex(asset),
        old_min_ratio,
        old_max_ratio,
        min_ratio,
        max_ratio,
        "token ratio changed"
    );
    Ok(())
}

pub fn set_fee_ratio(
    state: &mut BasketState,
    events: &mut EventLog,
    call: &CallContext,
    fee_mint_bps: u64,
    fee_burn_bps: u64,
) -> WaiResult<()> {
    state.set_fees(fee_mint_bps, fee_burn_bps)?;
    events.emit(WaiEvent::FeeRatioChanged {
        fee_mint_bps,
        fee_burn_bps,
        timestamp: call.timestamp,
    });
    tracing::info!(fee_mint_bps, fee_burn_bps, "fee ratio changed");
    Ok(())
}

// ============ Token Removal ============

/// Outcome of a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// Quantity of the removed asset sent to the treasury
    pub from_amount: Amount,
    /// Quantity of the destination asset added to the basket
    pub to_amount: Amount,
    /// Value moved (18 decimals)
    pub value: u128,
    /// Destination quantity pulled from the treasury
    pub pulled: Amount,
    /// Untracked destination surplus returned to the treasury
    pub swept: Amount,
}

/// Evacuate `from_asset` into `to_asset` at current prices and delete it.
///
/// The removed quantity goes to the treasury. The destination quantity of
/// equal value is taken from untracked destination holdings of the vault
/// first, with only the shortfall pulled from the treasury. Leftover
/// destination surplus goes back to the treasury.
#[allow(clippy::too_many_arguments)]
pub fn remove_token(
    state: &mut BasketState,
    oracle: &dyn PriceOracle,
    ledger: &mut dyn AssetLedger,
    events: &mut EventLog,
    call: &CallContext,
    from_asset: &AssetId,
    to_asset: &AssetId,
) -> WaiResult<Removal> {
    // 1. Validation
    let from = state.require(from_asset)?.clone();
    let to = state.require(to_asset)?.clone();
    if from_asset == to_asset {
        return Err(WaiError::SameAsset { asset: *from_asset });
    }
    if !to.enabled {
        return Err(WaiError::NotMintable { asset: *to_asset });
    }

    // 2. Convert at current prices
    let from_amount = from.tracked_balance;
    let (value, to_amount) = if from_amount == 0 {
        (0, 0)
    } else {
        let mut prices = PriceCache::new(oracle);
        let value = asset_value(from_amount, prices.get(from_asset)?, from.decimals)?;
        let to_amount = quantity_for_value(value, prices.get(to_asset)?, to.decimals)?;
        (value, to_amount)
    };

    // 3. Next state, under the joint bounds
    let mut next = state.clone();
    next.remove_asset(from_asset)?;
    next.credit(to_asset, to_amount)?;

    // 4. Preflight ledger holdings
    untracked_surplus(state, &*ledger, from_asset)?;
    let surplus = untracked_surplus(state, &*ledger, to_asset)?;
    let (pulled, swept) = if surplus >= to_amount {
        (0, surplus - to_amount)
    } else {
        (to_amount - surplus, 0)
    };
    if pulled > 0 {
        preflight_pull(&*ledger, to_asset, &state.treasury, &state.vault_account, pulled)?;
    }

    // 5. Effects
    if from_amount > 0 {
        ledger.transfer(from_asset, &state.vault_account, &state.treasury, from_amount)?;
    }
    if pulled > 0 {
        ledger.transfer_from(
            to_asset,
            &state.vault_account,
            &state.treasury,
            &state.vault_account,
            pulled,
        )?;
    }
    if swept > 0 {
        ledger.transfer(to_asset, &state.vault_account, &state.treasury, swept)?;
    }

    // 6. Commit
    *state = next;

    events.emit(WaiEvent::TokenRemoved {
        from_asset: *from_asset,
        from_amount,
        to_asset: *to_asset,
        to_amount,
        timestamp: call.timestamp,
    });
    if swept > 0 {
        events.emit(WaiEvent::SurplusSwept {
            asset: *to_asset,
            amount: swept,
            treasury: state.treasury,
            timestamp: call.timestamp,
        });
    }
    tracing::info!(
        from_asset = %short_hex(from_asset),
        from_amount,
        to_asset = %short_hex(to_asset),
        to_amount,
        value,
        pulled,
        swept,
        "token removed"
    );

    Ok(Removal {
        from_amount,
        to_amount,
        value,
        pulled,
        swept,
    })
}

// ============ Ledger Reconciliation ============

/// Held minus tracked for one asset. A vault holding less than it tracks
/// is `LedgerDesync`.
pub fn untracked_surplus(
    state: &BasketState,
    ledger: &dyn AssetLedger,
    asset: &AssetId,
) -> WaiResult<Amount> {
    let tracked = state.require(asset)?.tracked_balance;
    let held = ledger.balance_of(asset, &state.vault_account);
    if held < tracked {
        return Err(desync(*asset, tracked, held));
    }
    Ok(held - tracked)
}

/// Compare every tracked balance with the ledger.
///
/// Returns the assets holding untracked surplus. Never corrects anything.
pub fn verify_ledger_sync(state: &BasketState, ledger: &dyn AssetLedger) -> WaiResult<Vec<AssetAmount>> {
    let mut surplus = Vec::new();
    for entry in state.assets() {
        let extra = untracked_surplus(state, ledger, &entry.asset_id)?;
        if extra > 0 {
            surplus.push(AssetAmount::new(entry.asset_id, extra));
        }
    }
    Ok(surplus)
}

/// Send the untracked surplus of an asset to the treasury
pub fn sweep_surplus(
    state: &BasketState,
    ledger: &mut dyn AssetLedger,
    events: &mut EventLog,
    call: &CallContext,
    asset: &AssetId,
) -> WaiResult<Amount> {
    let amount = untracked_surplus(state, &*ledger, asset)?;
    if amount == 0 {
        return Ok(0);
    }

    ledger.transfer(asset, &state.vault_account, &state.treasury, amount)?;

    events.emit(WaiEvent::SurplusSwept {
        asset: *asset,
        amount,
        treasury: state.treasury,
        timestamp: call.timestamp,
    });
    tracing::info!(asset = %short_hex(asset), amount, "surplus swept");
    Ok(amount)
}

// ============ Tests ============
