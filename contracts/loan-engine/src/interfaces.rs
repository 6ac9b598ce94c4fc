//! Cross-contract clients for the collaborators the engine drives.

use soroban_sdk::{contractclient, Address, Bytes, Env};

use crate::types::{PositionSnapshot, RollOffer, RollPreview};

#[contractclient(name = "OracleClient")]
pub trait PriceOracle {
    /// Settlement currency per `base_unit` of the underlying asset.
    fn current_price(env: Env) -> i128;
    fn base_unit(env: Env) -> i128;
}

#[contractclient(name = "SwapperClient")]
pub trait Swapper {
    /// Pulls `amount_in` of `asset_in` from `caller` through an allowance and
    /// pays the output in `asset_out` back to `caller`.
    fn swap(
        env: Env,
        caller: Address,
        asset_in: Address,
        asset_out: Address,
        amount_in: i128,
        min_amount_out: i128,
        extra_data: Bytes,
    ) -> i128;
}

#[contractclient(name = "PositionBookClient")]
pub trait PositionBook {
    fn offer_put_strike(env: Env, offer_id: u64) -> u32;
    /// Pulls `taker_locked` from `caller` through an allowance and opens a
    /// paired position owned by `caller`.
    fn open_position(env: Env, caller: Address, taker_locked: i128, offer_id: u64) -> u64;
    fn position(env: Env, position_id: u64) -> PositionSnapshot;
    /// Taker balance and provider change if the position settled at `price`.
    fn preview_settlement(env: Env, position_id: u64, price: i128) -> (i128, i128);
    fn is_settled(env: Env, position_id: u64) -> bool;
    fn expiration(env: Env, position_id: u64) -> u64;
    fn settle(env: Env, position_id: u64);
    fn withdraw(env: Env, position_id: u64, to: Address) -> i128;
    fn transfer(env: Env, position_id: u64, to: Address);
}

#[contractclient(name = "RollExecutorClient")]
pub trait RollExecutor {
    fn get_offer(env: Env, roll_id: u64) -> RollOffer;
    fn preview_roll(env: Env, roll_id: u64, price: i128) -> RollPreview;
    /// Replaces the offer's position with a new one. Returns the new position
    /// id and the signed amount moved to (positive) or from (negative) `caller`.
    fn execute_roll(env: Env, caller: Address, roll_id: u64, min_to_taker: i128) -> (u64, i128);
}
