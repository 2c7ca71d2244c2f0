//! Mint/Burn Processor
//!
//! Issues and redeems basket shares. Every call follows the same order:
//!
//! 1. Validate inputs against the committed state
//! 2. Price the basket once through a per-call cache
//! 3. Compute the next state on a copy and run the economic guards
//! 4. Preflight every collaborator effect (balances, allowances, holdings)
//! 5. Apply token and ledger effects
//! 6. Commit the copy and emit events
//!
//! A call that fails at any step leaves the committed state untouched.
//! All arithmetic truncates toward zero, so rounding dust stays with the
//! basket.

use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use wai_common::{
    errors::{WaiError, WaiResult},
    events::{EventLog, WaiEvent},
    interfaces::{AssetLedger, PriceOracle, ShareToken},
    math::{
        asset_value, checked_sum, fee_amount, mul_div, price_per_share, ratio_bps,
        shares_for_value, split_fee, value_for_shares,
    },
    types::{short_hex, Address, Amount, AssetAmount, AssetId, CallContext, Price},
};

use crate::admin::untracked_surplus;
use crate::registry::BasketState;
use crate::valuation::{compute_snapshot, PriceCache, ValuationSnapshot};
use crate::Collaborators;

// ============ Receipts ============

/// Outcome of a mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct MintReceipt {
    /// Value of the deposits (18 decimals)
    pub deposit_value: u128,
    /// Price per share the deposit was priced at
    pub price_per_share: Price,
    /// Gross shares issued
    pub shares: Amount,
    /// Part of `shares` routed to the fee sink
    pub fee: Amount,
    /// Part of `shares` credited to the caller
    pub net_shares: Amount,
}

/// Outcome of a burn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BurnReceipt {
    pub shares: Amount,
    pub price_per_share: Price,
    /// Value redeemed (18 decimals)
    pub burn_value: u128,
    /// Net quantities sent to the caller, registry order
    pub payouts: Vec<AssetAmount>,
    /// Fee quantities sent to the fee sink, parallel to `payouts`
    pub fees: Vec<AssetAmount>,
}

// ============ Initial Mint ============

/// One-time conversion of the seed collateral into shares.
///
/// Adopts the vault account's ledger holdings of every registered asset
/// as tracked balances, values them, and issues `total_value / target_price`
/// shares to the treasury.
pub fn mint_initial(
    state: &mut BasketState,
    env: &mut Collaborators<'_>,
    events: &mut EventLog,
    call: &CallContext,
    target_price: Price,
) -> WaiResult<Amount> {
    // 1. One-way transition
    if state.initialized {
        return Err(guard(WaiError::AlreadyInitialized));
    }
    if target_price == 0 {
        return Err(WaiError::ZeroAmount);
    }

    // 2. Adopt the seed collateral
    let mut next = state.clone();
    for asset in state.asset_ids() {
        let held = env.ledger.balance_of(&asset, &state.vault_account);
        let tracked = state.token_balance(&asset);
        if held < tracked {
            return Err(desync(asset, tracked, held));
        }
        next.set_tracked_balance(&asset, held)?;
    }

    // 3. Value the basket
    let mut prices = PriceCache::new(env.oracle);
    let snapshot = compute_snapshot(&next, &mut prices)?;
    if snapshot.total_value == 0 {
        return Err(WaiError::EmptyBasket);
    }
    let shares = shares_for_value(snapshot.total_value, target_price)?;
    if shares == 0 {
        return Err(WaiError::ZeroAmount);
    }

    // 4. Effects
    env.shares.mint(&state.treasury, shares)?;

    // 5. Commit
    next.initialized = true;
    next.genesis_price = target_price;
    *state = next;

    events.emit(WaiEvent::InitialMint {
        treasury: state.treasury,
        total_value: snapshot.total_value,
        target_price,
        shares,
        timestamp: call.timestamp,
    });
    tracing::info!(
        total_value = snapshot.total_value,
        target_price,
        shares,
        "initial mint"
    );
    Ok(shares)
}

// ============ Mint ============

/// Deposit `amounts` of `assets` and receive shares at the current price.
///
/// Fails with `TargetPriceMoved` when the price per share is above
/// `max_price`.
#[allow(clippy::too_many_arguments)]
pub fn mint(
    state: &mut BasketState,
    env: &mut Collaborators<'_>,
    events: &mut EventLog,
    call: &CallContext,
    assets: &[AssetId],
    amounts: &[Amount],
    max_price: Price,
) -> WaiResult<MintReceipt> {
    // 1. Validation
    if !state.initialized {
        return Err(guard(WaiError::NotInitialized));
    }
    if assets.len() != amounts.len() {
        return Err(WaiError::LengthMismatch {
            assets: assets.len(),
            amounts: amounts.len(),
        });
    }
    if assets.is_empty() {
        return Err(WaiError::EmptyInput);
    }
    let mut seen = BTreeSet::new();
    for (asset, amount) in assets.iter().zip(amounts) {
        if !seen.insert(*asset) {
            return Err(WaiError::DuplicateInCall { asset: *asset });
        }
        if *amount == 0 {
            return Err(WaiError::ZeroAmount);
        }
    }
    for asset in assets {
        match state.entry(asset) {
            Some(entry) if entry.enabled => {}
            _ => return Err(guard(WaiError::NotMintable { asset: *asset })),
        }
    }

    // 2. Price before deposits
    let mut prices = PriceCache::new(env.oracle);
    let before = compute_snapshot(state, &mut prices)?;
    let supply = env.shares.total_supply();
    let price_per_share = current_price_per_share(state, &before, supply)?;
    if price_per_share > max_price {
        return Err(guard(WaiError::TargetPriceMoved {
            current: price_per_share,
            limit: max_price,
        }));
    }

    // 3. Apply deposits on a copy
    let mut next = state.clone();
    let mut values = Vec::with_capacity(assets.len());
    for (asset, amount) in assets.iter().zip(amounts) {
        let entry = next.require(asset)?;
        let price = prices.get(asset)?;
        values.push(asset_value(*amount, price, entry.decimals)?);
        next.credit(asset, *amount)?;
    }
    let deposit_value = checked_sum(values)?;

    // 4. Ratio guards on the post-deposit basket
    let after = compute_snapshot(&next, &mut prices)?;
    check_mint_ratios(&next, &after, assets)?;

    // 5. Shares and fee
    let shares = shares_for_value(deposit_value, price_per_share)?;
    if shares == 0 {
        return Err(WaiError::ZeroAmount);
    }
    let (net_shares, fee) = split_fee(shares, state.fee_mint_bps)?;

    // 6. Preflight pulls
    for (asset, amount) in assets.iter().zip(amounts) {
        preflight_pull(&*env.ledger, asset, &call.caller, &state.vault_account, *amount)?;
    }

    // 7. Effects: collateral in, then shares out
    for (asset, amount) in assets.iter().zip(amounts) {
        env.ledger.transfer_from(
            asset,
            &state.vault_account,
            &call.caller,
            &state.vault_account,
            *amount,
        )?;
    }
    if fee > 0 {
        env.shares.mint(&state.fee_sink, fee)?;
    }
    if net_shares > 0 {
        env.shares.mint(&call.caller, net_shares)?;
    }

    // 8. Commit
    *state = next;

    let deposits: Vec<AssetAmount> = assets
        .iter()
        .zip(amounts)
        .map(|(asset, amount)| AssetAmount::new(*asset, *amount))
        .collect();
    events.emit(WaiEvent::Minted {
        caller: call.caller,
        deposits,
        shares,
        fee,
        price_per_share,
        timestamp: call.timestamp,
    });
    tracing::info!(
        caller = %short_hex(&call.caller),
        deposit_value,
        price_per_share,
        shares,
        fee,
        "minted"
    );

    Ok(MintReceipt {
        deposit_value,
        price_per_share,
        shares,
        fee,
        net_shares,
    })
}

/// Fail-fast in registry order: a deposited asset above its max is
/// `OverRatio`; an enabled asset left out of the call below its min is
/// `UnderRatio`.
fn check_mint_ratios(
    state: &BasketState,
    snapshot: &ValuationSnapshot,
    touched: &[AssetId],
) -> WaiResult<()> {
    for (entry, valuation) in state.assets().iter().zip(&snapshot.assets) {
        let ratio = ratio_bps(valuation.value, snapshot.total_value)?;
        let deposited = touched.contains(&entry.asset_id);

        if deposited && ratio > entry.max_ratio {
            return Err(guard(WaiError::OverRatio {
                asset: entry.asset_id,
                ratio_bps: ratio,
                max_ratio: entry.max_ratio,
            }));
        }
        if !deposited && entry.enabled && ratio < entry.min_ratio {
            return Err(guard(WaiError::UnderRatio {
                asset: entry.asset_id,
                ratio_bps: ratio,
                min_ratio: entry.min_ratio,
            }));
        }
    }
    Ok(())
}

// ============ Burn ============

/// Redeem `shares` pro rata across every asset the basket holds.
///
/// Fails with `TargetPriceMoved` when the price per share is below
/// `min_price`.
pub fn burn(
    state: &mut BasketState,
    env: &mut Collaborators<'_>,
    events: &mut EventLog,
    call: &CallContext,
    shares: Amount,
    min_price: Price,
) -> WaiResult<BurnReceipt> {
    // 1. Validation
    if !state.initialized {
        return Err(guard(WaiError::NotInitialized));
    }
    if shares == 0 {
        return Err(WaiError::ZeroAmount);
    }
    let held = env.shares.balance_of(&call.caller);
    if held < shares {
        return Err(guard(WaiError::InsufficientBalance {
            available: held,
            requested: shares,
        }));
    }

    // 2. Price
    let mut prices = PriceCache::new(env.oracle);
    let snapshot = compute_snapshot(state, &mut prices)?;
    if snapshot.total_value == 0 {
        return Err(WaiError::EmptyBasket);
    }
    let supply = env.shares.total_supply();
    let price_per_share = current_price_per_share(state, &snapshot, supply)?;
    if price_per_share < min_price {
        return Err(guard(WaiError::TargetPriceMoved {
            current: price_per_share,
            limit: min_price,
        }));
    }
    let burn_value = value_for_shares(shares, price_per_share)?;

    // 3. Payout legs, proportional to tracked balances
    let mut next = state.clone();
    let mut payouts = Vec::new();
    let mut fees = Vec::new();
    for entry in state.assets().iter().filter(|e| e.tracked_balance > 0) {
        let payout = mul_div(burn_value, entry.tracked_balance, snapshot.total_value)?;
        if payout == 0 {
            continue;
        }
        let fee = fee_amount(payout, state.fee_burn_bps)?;
        let net = payout.checked_sub(fee).ok_or(WaiError::Underflow)?;
        next.debit(&entry.asset_id, payout)?;
        payouts.push(AssetAmount::new(entry.asset_id, net));
        fees.push(AssetAmount::new(entry.asset_id, fee));
    }

    // 4. Preflight: the vault must hold what it tracks
    for leg in &payouts {
        untracked_surplus(state, &*env.ledger, &leg.asset)?;
    }

    // 5. Effects: shares out, then collateral
    env.shares.burn(&call.caller, shares)?;
    for (payout, fee) in payouts.iter().zip(&fees) {
        if fee.amount > 0 {
            env.ledger
                .transfer(&fee.asset, &state.vault_account, &state.fee_sink, fee.amount)?;
        }
        if payout.amount > 0 {
            env.ledger
                .transfer(&payout.asset, &state.vault_account, &call.caller, payout.amount)?;
        }
    }

    // 6. Commit
    *state = next;

    events.emit(WaiEvent::Burned {
        caller: call.caller,
        shares,
        payouts: payouts.clone(),
        fees: fees.clone(),
        price_per_share,
        timestamp: call.timestamp,
    });
    tracing::info!(
        caller = %short_hex(&call.caller),
        shares,
        burn_value,
        price_per_share,
        legs = payouts.len(),
        "burned"
    );

    Ok(BurnReceipt {
        shares,
        price_per_share,
        burn_value,
        payouts,
        fees,
    })
}

// ============ Queries ============

/// Value of one share.
///
/// Returns the genesis price while no shares are outstanding after the
/// initial mint.
pub fn get_price_per_share(
    state: &BasketState,
    oracle: &dyn PriceOracle,
    shares: &dyn ShareToken,
) -> WaiResult<Price> {
    if !state.initialized {
        return Err(WaiError::NotInitialized);
    }
    let supply = shares.total_supply();
    if supply == 0 {
        return Ok(state.genesis_price);
    }
    let mut prices = PriceCache::new(oracle);
    let snapshot = compute_snapshot(state, &mut prices)?;
    price_per_share(snapshot.total_value, supply)
}

fn current_price_per_share(
    state: &BasketState,
    snapshot: &ValuationSnapshot,
    supply: Amount,
) -> WaiResult<Price> {
    let price = if supply == 0 {
        state.genesis_price
    } else {
        price_per_share(snapshot.total_value, supply)?
    };
    if price == 0 {
        return Err(WaiError::EmptyBasket);
    }
    Ok(price)
}

// ============ Settlement Helpers ============

/// Check that `spender` can pull `amount` of `owner`'s `asset`
pub(crate) fn preflight_pull(
    ledger: &dyn AssetLedger,
    asset: &AssetId,
    owner: &Address,
    spender: &Address,
    amount: Amount,
) -> WaiResult<()> {
    let allowed = ledger.allowance(asset, owner, spender);
    if allowed < amount {
        return Err(guard(WaiError::InsufficientAllowance {
            available: allowed,
            requested: amount,
        }));
    }
    let available = ledger.balance_of(asset, owner);
    if available < amount {
        return Err(guard(WaiError::InsufficientBalance {
            available,
            requested: amount,
        }));
    }
    Ok(())
}

pub(crate) fn desync(asset: AssetId, tracked: Amount, held: Amount) -> WaiError {
    tracing::warn!(asset = %short_hex(&asset), tracked, held, "ledger holds less than tracked");
    WaiError::LedgerDesync {
        asset,
        tracked,
        held,
    }
}

/// Log an economic-guard rejection
fn guard(err: WaiError) -> WaiError {
    tracing::warn!(code = err.code(), %err, "call rejected");
    err
}

// ============ Tests ============
