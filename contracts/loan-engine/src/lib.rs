//! Collared Loan Engine
//!
//! Borrowers deposit an underlying asset, which is swapped into a settlement
//! currency and split into a loan and the taker side of a collar position
//! opened against a liquidity provider's offer. Loans can later be closed
//! (repaid and swapped back), rolled into a new position without full
//! repayment, or cancelled by taking the position out of custody.

#![no_std]

mod errors;
mod interfaces;
mod lifecycle;
pub mod roll_math;
mod storage;
mod swap;
mod types;


use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Symbol};

pub use errors::ContractError;
pub use interfaces::{
    OracleClient, PositionBook, PositionBookClient, PriceOracle, RollExecutor, RollExecutorClient,
    Swapper, SwapperClient,
};
pub use swap::MAX_SWAP_PRICE_DEVIATION_BIPS;
pub use types::{
    EngineConfig, Loan, LoanRollPreview, LoanStatus, PositionSnapshot, RollOffer, RollPreview,
    SwapParams,
};

use lifecycle::{Finalization, LoanEntry};

pub const BIPS_BASE: i128 = 10_000;

const EVT_INIT: Symbol = symbol_short!("init");
const EVT_KEEPER: Symbol = symbol_short!("keeper");
const EVT_SWAPPER: Symbol = symbol_short!("swapper");
const EVT_KEEPER_APPROVAL: Symbol = symbol_short!("keeper_ok");
const EVT_OPENED: Symbol = symbol_short!("loan_open");
const EVT_CLOSED: Symbol = symbol_short!("loan_cls");
const EVT_ROLLED: Symbol = symbol_short!("loan_roll");
const EVT_CANCELLED: Symbol = symbol_short!("loan_cncl");
const EVT_TRANSFERRED: Symbol = symbol_short!("loan_xfer");

#[contract]
pub struct LoanEngine;

#[contractimpl]
impl LoanEngine {
    /// Initialize the engine with its assets and collaborator contracts.
    pub fn initialize(
        env: Env,
        admin: Address,
        underlying: Address,
        cash_asset: Address,
        oracle: Address,
        position_book: Address,
        roll_executor: Address,
    ) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }

        let config = EngineConfig {
            admin: admin.clone(),
            underlying,
            cash_asset,
            oracle,
            position_book,
            roll_executor,
            keeper: None,
        };
        storage::write_config(&env, &config);

        env.events().publish((EVT_INIT,), (admin,));
        Ok(())
    }

    pub fn config(env: Env) -> Result<EngineConfig, ContractError> {
        storage::read_config(&env)
    }

    /// Set the keeper allowed to close loans for owners who approve it.
    /// Admin only.
    pub fn set_keeper(env: Env, keeper: Address) -> Result<(), ContractError> {
        let mut config = storage::read_config(&env)?;
        config.admin.require_auth();

        config.keeper = Some(keeper.clone());
        storage::write_config(&env, &config);

        env.events().publish((EVT_KEEPER,), (keeper,));
        Ok(())
    }

    /// Allow or disallow a swapper. Admin only.
    pub fn set_swapper_allowed(
        env: Env,
        swapper: Address,
        allowed: bool,
    ) -> Result<(), ContractError> {
        let config = storage::read_config(&env)?;
        config.admin.require_auth();

        storage::set_swapper_allowed(&env, &swapper, allowed);

        env.events().publish((EVT_SWAPPER,), (swapper, allowed));
        Ok(())
    }

    pub fn is_swapper_allowed(env: Env, swapper: Address) -> bool {
        storage::swapper_allowed(&env, &swapper)
    }

    /// Let the configured keeper close any loan `owner` holds.
    ///
    /// The approval belongs to the owner, not to a loan: loans transferred
    /// to someone else are only keeper-closable if the new owner approves.
    pub fn set_keeper_approval(
        env: Env,
        owner: Address,
        enabled: bool,
    ) -> Result<(), ContractError> {
        storage::read_config(&env)?;
        owner.require_auth();

        storage::set_keeper_approved(&env, &owner, enabled);

        env.events().publish((EVT_KEEPER_APPROVAL,), (owner, enabled));
        Ok(())
    }

    pub fn keeper_approved(env: Env, owner: Address) -> bool {
        storage::keeper_approved(&env, &owner)
    }

    /// Open a loan by depositing `underlying_amount`.
    ///
    /// The deposit is swapped to the settlement currency. The offer's put
    /// strike decides the share released as the loan; the rest is locked in
    /// a collar position held by the engine. The position id is the loan id.
    ///
    /// # Returns
    /// Loan ID and loan amount
    pub fn open_loan(
        env: Env,
        borrower: Address,
        underlying_amount: i128,
        min_loan_amount: i128,
        swap_params: SwapParams,
        offer_id: u64,
    ) -> Result<(u64, i128), ContractError> {
        borrower.require_auth();
        let config = storage::read_config(&env)?;

        if underlying_amount == 0 {
            return Err(ContractError::ZeroDeposit);
        }
        if underlying_amount < 0 || min_loan_amount < 0 {
            return Err(ContractError::InvalidAmount);
        }

        let this = env.current_contract_address();
        token::Client::new(&env, &config.underlying).transfer(
            &borrower,
            &this,
            &underlying_amount,
        );

        let cash_amount = swap::swap(
            &env,
            &config.underlying,
            &config.cash_asset,
            underlying_amount,
            &swap_params,
        )?;
        swap::check_swap_price(&env, &config.oracle, underlying_amount, cash_amount)?;

        let book = PositionBookClient::new(&env, &config.position_book);
        let put_strike = book.offer_put_strike(&offer_id) as i128;
        if put_strike <= 0 || put_strike >= BIPS_BASE {
            return Err(ContractError::InvalidStrike);
        }

        let loan_amount = cash_amount
            .checked_mul(put_strike)
            .ok_or(ContractError::MathOverflow)?
            / BIPS_BASE;
        let taker_locked = cash_amount - loan_amount;

        if loan_amount < min_loan_amount {
            return Err(ContractError::SlippageTooLow);
        }

        let cash = token::Client::new(&env, &config.cash_asset);
        cash.approve(
            &this,
            &config.position_book,
            &taker_locked,
            &env.ledger().sequence(),
        );
        let loan_id = book.open_position(&this, &taker_locked, &offer_id);

        let loan = Loan {
            underlying_amount,
            loan_amount,
            keeper_delegate: Self::keeper_delegate(&env, &config, &borrower),
            status: LoanStatus::Active,
            opened_at: env.ledger().timestamp(),
        };
        storage::write_loan(&env, loan_id, &loan);
        storage::write_owner(&env, loan_id, &borrower);

        cash.transfer(&this, &borrower, &loan_amount);

        env.events().publish(
            (EVT_OPENED,),
            (loan_id, borrower, underlying_amount, loan_amount, taker_locked),
        );

        Ok((loan_id, loan_amount))
    }

    /// Close a loan: collect the repayment, settle and withdraw the position,
    /// and swap everything back to the underlying asset for the owner.
    ///
    /// Callable by the owner, or by the keeper if the current owner approved
    /// it. The repayment is pulled from the owner through an allowance.
    ///
    /// # Returns
    /// Underlying amount released to the owner
    pub fn close_loan(
        env: Env,
        caller: Address,
        loan_id: u64,
        swap_params: SwapParams,
    ) -> Result<i128, ContractError> {
        caller.require_auth();
        let config = storage::read_config(&env)?;

        let entry = LoanEntry::load_active(&env, loan_id)?;
        entry.authorize(&env, &caller, config.keeper.as_ref())?;
        let entry = entry.seal(&env, Finalization::Closed);

        let owner = entry.owner().clone();
        let repayment = entry.loan().loan_amount;
        let this = env.current_contract_address();

        if repayment > 0 {
            token::Client::new(&env, &config.cash_asset).transfer_from(
                &this,
                &owner,
                &this,
                &repayment,
            );
        }

        let withdrawn = Self::settle_and_withdraw(&env, &config, loan_id)?;
        let cash_total = repayment
            .checked_add(withdrawn)
            .ok_or(ContractError::MathOverflow)?;

        // No deviation check on this leg: its price only affects the
        // owner's own proceeds.
        let underlying_out = swap::swap(
            &env,
            &config.cash_asset,
            &config.underlying,
            cash_total,
            &swap_params,
        )?;

        token::Client::new(&env, &config.underlying).transfer(&this, &owner, &underlying_out);

        env.events().publish(
            (EVT_CLOSED,),
            (loan_id, caller, owner, repayment, withdrawn, underlying_out),
        );

        Ok(underlying_out)
    }

    /// What `roll_loan` would do at the current oracle price.
    pub fn preview_roll(
        env: Env,
        loan_id: u64,
        roll_id: u64,
    ) -> Result<LoanRollPreview, ContractError> {
        let config = storage::read_config(&env)?;
        let loan = storage::read_loan(&env, loan_id).ok_or(ContractError::LoanNotFound)?;
        if loan.status.is_terminal() {
            return Err(ContractError::NotActive);
        }

        let rolls = RollExecutorClient::new(&env, &config.roll_executor);
        Self::validate_roll_offer(&env, &rolls, roll_id, loan_id)?;

        let price = OracleClient::new(&env, &config.oracle).current_price();
        let preview = rolls.preview_roll(&roll_id, &price);
        let new_loan_amount =
            roll_math::apply_roll(loan.loan_amount, preview.to_taker, preview.roll_fee)?;

        Ok(LoanRollPreview {
            to_owner: preview.to_taker,
            roll_fee: preview.roll_fee,
            new_loan_amount,
        })
    }

    /// Roll a loan into the position offered by `roll_id`.
    ///
    /// Any amount the roll owes is pulled from the owner before the executor
    /// runs; any amount it pays out is forwarded to the owner. The engine's
    /// settlement-currency balance must be unchanged at the end. Owner only.
    ///
    /// # Returns
    /// New loan ID, new loan amount, and the signed amount paid to the owner
    pub fn roll_loan(
        env: Env,
        owner: Address,
        loan_id: u64,
        roll_id: u64,
        min_to_owner: i128,
    ) -> Result<(u64, i128, i128), ContractError> {
        owner.require_auth();
        let config = storage::read_config(&env)?;

        let entry = LoanEntry::load_active(&env, loan_id)?;
        if *entry.owner() != owner {
            return Err(ContractError::Unauthorized);
        }

        let rolls = RollExecutorClient::new(&env, &config.roll_executor);
        Self::validate_roll_offer(&env, &rolls, roll_id, loan_id)?;

        let entry = entry.seal(&env, Finalization::Rolled);

        let price = OracleClient::new(&env, &config.oracle).current_price();
        let preview = rolls.preview_roll(&roll_id, &price);
        let new_loan_amount = roll_math::apply_roll(
            entry.loan().loan_amount,
            preview.to_taker,
            preview.roll_fee,
        )?;

        let this = env.current_contract_address();
        let cash = token::Client::new(&env, &config.cash_asset);
        let expiration = env.ledger().sequence();
        let balance_before = cash.balance(&this);

        if preview.to_taker < 0 {
            let owed = preview
                .to_taker
                .checked_neg()
                .ok_or(ContractError::MathOverflow)?;
            cash.transfer(&owner, &this, &owed);
            cash.approve(&this, &config.roll_executor, &owed, &expiration);
        }

        PositionBookClient::new(&env, &config.position_book)
            .transfer(&loan_id, &config.roll_executor);
        let (new_loan_id, transfer) = rolls.execute_roll(&this, &roll_id, &min_to_owner);

        if transfer != preview.to_taker {
            return Err(ContractError::TransferMismatch);
        }
        if transfer < min_to_owner {
            return Err(ContractError::SlippageTooLow);
        }

        if transfer > 0 {
            cash.transfer(&this, &owner, &transfer);
        } else if transfer < 0 {
            cash.approve(&this, &config.roll_executor, &0, &expiration);
        }

        if cash.balance(&this) != balance_before {
            return Err(ContractError::BalanceInvariantViolated);
        }

        let loan = Loan {
            underlying_amount: entry.loan().underlying_amount,
            loan_amount: new_loan_amount,
            keeper_delegate: Self::keeper_delegate(&env, &config, &owner),
            status: LoanStatus::Active,
            opened_at: env.ledger().timestamp(),
        };
        storage::write_loan(&env, new_loan_id, &loan);
        storage::write_owner(&env, new_loan_id, &owner);

        env.events().publish(
            (EVT_ROLLED,),
            (
                loan_id,
                new_loan_id,
                owner,
                transfer,
                preview.roll_fee,
                new_loan_amount,
            ),
        );

        Ok((new_loan_id, new_loan_amount, transfer))
    }

    /// Cancel a loan without repayment and hand the unsettled position to
    /// the owner. The borrowed funds stay with the owner. Owner only.
    pub fn cancel_loan(env: Env, owner: Address, loan_id: u64) -> Result<(), ContractError> {
        owner.require_auth();
        let config = storage::read_config(&env)?;

        let entry = LoanEntry::load_active(&env, loan_id)?;
        if *entry.owner() != owner {
            return Err(ContractError::Unauthorized);
        }
        let entry = entry.seal(&env, Finalization::Cancelled);

        let book = PositionBookClient::new(&env, &config.position_book);
        if book.is_settled(&loan_id) {
            return Err(ContractError::PositionSettled);
        }
        book.transfer(&loan_id, &owner);

        env.events().publish(
            (EVT_CANCELLED,),
            (loan_id, owner, entry.loan().loan_amount),
        );

        Ok(())
    }

    /// Transfer ownership of an active loan.
    pub fn transfer_loan(
        env: Env,
        from: Address,
        to: Address,
        loan_id: u64,
    ) -> Result<(), ContractError> {
        from.require_auth();
        storage::read_config(&env)?;

        let entry = LoanEntry::load_active(&env, loan_id)?;
        if *entry.owner() != from {
            return Err(ContractError::Unauthorized);
        }
        storage::write_owner(&env, loan_id, &to);

        env.events().publish((EVT_TRANSFERRED,), (loan_id, from, to));
        Ok(())
    }

    /// Get loan details
    pub fn get_loan(env: Env, loan_id: u64) -> Option<Loan> {
        storage::read_loan(&env, loan_id)
    }

    /// Current owner of an active loan
    pub fn owner_of(env: Env, loan_id: u64) -> Option<Address> {
        storage::read_owner(&env, loan_id)
    }

    fn keeper_delegate(env: &Env, config: &EngineConfig, owner: &Address) -> Option<Address> {
        if storage::keeper_approved(env, owner) {
            config.keeper.clone()
        } else {
            None
        }
    }

    fn validate_roll_offer(
        env: &Env,
        rolls: &RollExecutorClient,
        roll_id: u64,
        loan_id: u64,
    ) -> Result<(), ContractError> {
        let offer = rolls.get_offer(&roll_id);
        if !offer.active
            || offer.position_id != loan_id
            || env.ledger().timestamp() > offer.deadline
        {
            return Err(ContractError::InvalidRollOffer);
        }
        Ok(())
    }

    fn settle_and_withdraw(
        env: &Env,
        config: &EngineConfig,
        position_id: u64,
    ) -> Result<i128, ContractError> {
        let book = PositionBookClient::new(env, &config.position_book);
        if !book.is_settled(&position_id) {
            if env.ledger().timestamp() < book.expiration(&position_id) {
                return Err(ContractError::NotYetSettleable);
            }
            book.settle(&position_id);
        }
        Ok(book.withdraw(&position_id, &env.current_contract_address()))
    }
}
