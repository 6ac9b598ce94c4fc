use soroban_sdk::{contracttype, Address, Bytes};

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoanStatus {
    Active = 0,
    Closed = 1,
    Rolled = 2,
    Cancelled = 3,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Active)
    }
}

/// A loan backed by a collar position held in custody by the engine.
///
/// Keyed by the position identifier returned by the position book. Records
/// are kept after they reach a terminal status so that later calls against
/// the same identifier observe them as finalized.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    /// Amount of the deposited (underlying) asset
    pub underlying_amount: i128,
    /// Settlement currency released to the borrower
    pub loan_amount: i128,
    /// Keeper the owner had approved when this record was written
    pub keeper_delegate: Option<Address>,
    pub status: LoanStatus,
    pub opened_at: u64,
}

/// Parameters for one leg of currency conversion.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapParams {
    pub swapper: Address,
    pub min_amount_out: i128,
    /// Opaque routing data forwarded to the swapper
    pub extra_data: Bytes,
}

/// Engine configuration, written once at initialization.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    pub admin: Address,
    /// Asset deposited by borrowers
    pub underlying: Address,
    /// Settlement currency the position book and loans are denominated in
    pub cash_asset: Address,
    pub oracle: Address,
    pub position_book: Address,
    pub roll_executor: Address,
    pub keeper: Option<Address>,
}

/// Position book view of a paired position.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionSnapshot {
    pub taker_locked: i128,
    pub provider_locked: i128,
    pub put_strike_bips: u32,
    pub call_strike_bips: u32,
    pub start_price: i128,
    pub expiration: u64,
    pub settled: bool,
}

/// Roll executor view of an offer to replace a position.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RollOffer {
    pub position_id: u64,
    pub provider: Address,
    pub fee_amount: i128,
    pub fee_delta_factor_bips: i128,
    pub fee_reference_price: i128,
    pub deadline: u64,
    pub active: bool,
}

/// Signed amounts that replacing a position would move at a given price.
/// Positive `to_taker` is paid to the loan owner, negative is owed by them.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RollPreview {
    pub to_taker: i128,
    pub to_provider: i128,
    pub roll_fee: i128,
    pub new_taker_locked: i128,
    pub new_provider_locked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanRollPreview {
    pub to_owner: i128,
    pub roll_fee: i128,
    pub new_loan_amount: i128,
}
