//! Roll arithmetic.
//!
//! Pure functions shared by the engine and by roll executors: the fee an
//! offer charges at a given price, the amounts that replacing a position
//! moves, and the closed-form update of a loan amount after a roll.

use crate::errors::ContractError;
use crate::types::{PositionSnapshot, RollPreview};
use crate::BIPS_BASE;

/// Roll fee at `price`.
///
/// The fee moves with price relative to `fee_reference_price`, scaled by
/// `fee_delta_factor_bips`:
/// `fee + |fee| * factor * (price - reference) / reference / 10_000`
pub fn calculate_roll_fee(
    fee_amount: i128,
    fee_delta_factor_bips: i128,
    fee_reference_price: i128,
    price: i128,
) -> Result<i128, ContractError> {
    if fee_reference_price <= 0 || price <= 0 {
        return Err(ContractError::InvalidPrice);
    }
    let price_change = price
        .checked_sub(fee_reference_price)
        .ok_or(ContractError::MathOverflow)?;
    let fee_size = fee_amount.checked_abs().ok_or(ContractError::MathOverflow)?;

    let change = fee_size
        .checked_mul(fee_delta_factor_bips)
        .and_then(|v| v.checked_mul(price_change))
        .ok_or(ContractError::MathOverflow)?
        / fee_reference_price
        / BIPS_BASE;

    fee_amount
        .checked_add(change)
        .ok_or(ContractError::MathOverflow)
}

/// Provider collateral matching `taker_locked` for the given strikes.
pub fn provider_locked_for(
    taker_locked: i128,
    put_strike_bips: u32,
    call_strike_bips: u32,
) -> Result<i128, ContractError> {
    let put = put_strike_bips as i128;
    let call = call_strike_bips as i128;
    if put <= 0 || put >= BIPS_BASE || call <= BIPS_BASE {
        return Err(ContractError::InvalidStrike);
    }

    taker_locked
        .checked_mul(call - BIPS_BASE)
        .ok_or(ContractError::MathOverflow)?
        .checked_div(BIPS_BASE - put)
        .ok_or(ContractError::MathOverflow)
}

/// Amounts moved by replacing `position` with a new one started at `price`.
///
/// `taker_settled` and `provider_change` are the position book's settlement
/// of the old position at `price`. The new position keeps the same strikes
/// and scales the taker side with price.
pub fn preview_roll(
    position: &PositionSnapshot,
    taker_settled: i128,
    provider_change: i128,
    price: i128,
    roll_fee: i128,
) -> Result<RollPreview, ContractError> {
    if position.start_price <= 0 || price <= 0 {
        return Err(ContractError::InvalidPrice);
    }

    let new_taker_locked = position
        .taker_locked
        .checked_mul(price)
        .ok_or(ContractError::MathOverflow)?
        / position.start_price;
    let new_provider_locked = provider_locked_for(
        new_taker_locked,
        position.put_strike_bips,
        position.call_strike_bips,
    )?;

    let provider_settled = position
        .provider_locked
        .checked_add(provider_change)
        .ok_or(ContractError::MathOverflow)?;

    let to_taker = taker_settled
        .checked_sub(new_taker_locked)
        .and_then(|v| v.checked_sub(roll_fee))
        .ok_or(ContractError::MathOverflow)?;
    let to_provider = provider_settled
        .checked_sub(new_provider_locked)
        .and_then(|v| v.checked_add(roll_fee))
        .ok_or(ContractError::MathOverflow)?;

    Ok(RollPreview {
        to_taker,
        to_provider,
        roll_fee,
        new_taker_locked,
        new_provider_locked,
    })
}

/// Loan amount after a roll that moved `transfer` to the owner and charged
/// `roll_fee`.
///
/// The fee was netted out of `transfer`, so it is added back: the fee is
/// paid by the owner and never becomes principal. A negative delta is a
/// repayment and cannot exceed the existing loan.
pub fn apply_roll(
    old_loan_amount: i128,
    transfer: i128,
    roll_fee: i128,
) -> Result<i128, ContractError> {
    let loan_delta = transfer
        .checked_add(roll_fee)
        .ok_or(ContractError::MathOverflow)?;

    if loan_delta < 0 {
        let repayment = loan_delta.checked_neg().ok_or(ContractError::MathOverflow)?;
        if repayment > old_loan_amount {
            return Err(ContractError::RepaymentExceedsLoan);
        }
        Ok(old_loan_amount - repayment)
    } else {
        old_loan_amount
            .checked_add(loan_delta)
            .ok_or(ContractError::MathOverflow)
    }
}
