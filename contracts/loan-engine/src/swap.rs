//! Currency conversion through an allowed swapper, and the price deviation
//! guard applied to the deposit leg.

use soroban_sdk::{symbol_short, token, Address, Env};

use crate::errors::ContractError;
use crate::interfaces::{OracleClient, SwapperClient};
use crate::storage;
use crate::types::SwapParams;
use crate::BIPS_BASE;

/// Maximum distance between the realized swap price and the oracle price.
pub const MAX_SWAP_PRICE_DEVIATION_BIPS: i128 = 500;

/// Converts `amount_in` of `asset_in` into `asset_out`.
///
/// The swapper pulls the input through a one-ledger allowance that is reset
/// afterwards. The output is measured as the engine's balance delta and must
/// match what the swapper reported.
pub fn swap(
    env: &Env,
    asset_in: &Address,
    asset_out: &Address,
    amount_in: i128,
    params: &SwapParams,
) -> Result<i128, ContractError> {
    if !storage::swapper_allowed(env, &params.swapper) {
        return Err(ContractError::UnsupportedSwapper);
    }

    let this = env.current_contract_address();
    let token_in = token::Client::new(env, asset_in);
    let token_out = token::Client::new(env, asset_out);
    let expiration = env.ledger().sequence();

    let balance_before = token_out.balance(&this);
    token_in.approve(&this, &params.swapper, &amount_in, &expiration);

    let reported = SwapperClient::new(env, &params.swapper).swap(
        &this,
        asset_in,
        asset_out,
        &amount_in,
        &params.min_amount_out,
        &params.extra_data,
    );

    token_in.approve(&this, &params.swapper, &0, &expiration);
    let received = token_out
        .balance(&this)
        .checked_sub(balance_before)
        .ok_or(ContractError::MathOverflow)?;

    if reported != received {
        return Err(ContractError::SwapBalanceMismatch);
    }
    if received < params.min_amount_out {
        return Err(ContractError::SwapOutputTooLow);
    }

    env.events().publish(
        (symbol_short!("swap"),),
        (asset_in.clone(), amount_in, received),
    );

    Ok(received)
}

/// Rejects a deposit-leg conversion whose price is too far from the oracle.
///
/// The oracle is read after the swap has executed, so a swap large enough to
/// move the feed itself is not caught here. Position settlement uses the
/// oracle price, so this check only affects sizing.
pub fn check_swap_price(
    env: &Env,
    oracle: &Address,
    underlying_amount: i128,
    cash_amount: i128,
) -> Result<(), ContractError> {
    let oracle = OracleClient::new(env, oracle);
    let reference = oracle.current_price();
    let price = swap_price(cash_amount, underlying_amount, oracle.base_unit())?;

    if exceeds_deviation(price, reference, MAX_SWAP_PRICE_DEVIATION_BIPS)? {
        return Err(ContractError::PriceDeviationTooHigh);
    }
    Ok(())
}

/// Settlement currency per `base_unit` of underlying realized by a swap.
pub fn swap_price(
    cash_amount: i128,
    underlying_amount: i128,
    base_unit: i128,
) -> Result<i128, ContractError> {
    if underlying_amount <= 0 {
        return Err(ContractError::ZeroDeposit);
    }
    if base_unit <= 0 {
        return Err(ContractError::InvalidPrice);
    }
    cash_amount
        .checked_mul(base_unit)
        .ok_or(ContractError::MathOverflow)?
        .checked_div(underlying_amount)
        .ok_or(ContractError::MathOverflow)
}

/// True when `|price - reference| / reference` is strictly above
/// `max_bips / 10_000`. Compared cross-multiplied so no rounding is lost.
pub fn exceeds_deviation(
    price: i128,
    reference: i128,
    max_bips: i128,
) -> Result<bool, ContractError> {
    if reference <= 0 {
        return Err(ContractError::InvalidPrice);
    }
    let diff = price
        .checked_sub(reference)
        .and_then(|d| d.checked_abs())
        .ok_or(ContractError::MathOverflow)?;
    let scaled_diff = diff
        .checked_mul(BIPS_BASE)
        .ok_or(ContractError::MathOverflow)?;
    let bound = reference
        .checked_mul(max_bips)
        .ok_or(ContractError::MathOverflow)?;

    Ok(scaled_diff > bound)
}
