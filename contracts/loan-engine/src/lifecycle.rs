//! Phase-tagged access to a loan record.
//!
//! Close, roll and cancel all hand funds or the position to external
//! contracts. Before any such call the loan must already be terminal in
//! storage, so a reentrant call against the same id is rejected with
//! `NotActive`. `LoanEntry<Unsealed>` is the only way to obtain a loan for
//! those operations, and the only thing it can do besides being read is
//! `seal`, which writes the terminal status and yields a read-only
//! `LoanEntry<Sealed>`.

use core::marker::PhantomData;

use soroban_sdk::{Address, Env};

use crate::errors::ContractError;
use crate::storage;
use crate::types::{Loan, LoanStatus};

pub struct Unsealed;
pub struct Sealed;

/// Terminal statuses a loan can be sealed with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Finalization {
    Closed,
    Rolled,
    Cancelled,
}

impl From<Finalization> for LoanStatus {
    fn from(value: Finalization) -> Self {
        match value {
            Finalization::Closed => LoanStatus::Closed,
            Finalization::Rolled => LoanStatus::Rolled,
            Finalization::Cancelled => LoanStatus::Cancelled,
        }
    }
}

pub struct LoanEntry<Phase> {
    id: u64,
    loan: Loan,
    owner: Address,
    _phase: PhantomData<Phase>,
}

impl<Phase> LoanEntry<Phase> {
    pub fn loan(&self) -> &Loan {
        &self.loan
    }

    /// Owner at the time the entry was loaded.
    pub fn owner(&self) -> &Address {
        &self.owner
    }
}

impl LoanEntry<Unsealed> {
    /// Loads an active loan. The status check runs before anything else so
    /// that every call against a finalized loan fails the same way.
    pub fn load_active(env: &Env, loan_id: u64) -> Result<Self, ContractError> {
        let loan = storage::read_loan(env, loan_id).ok_or(ContractError::LoanNotFound)?;
        if loan.status.is_terminal() {
            return Err(ContractError::NotActive);
        }
        let owner = storage::read_owner(env, loan_id).ok_or(ContractError::LoanNotFound)?;

        Ok(Self {
            id: loan_id,
            loan,
            owner,
            _phase: PhantomData,
        })
    }

    /// Owner or, for keeper-closable operations, the configured keeper when
    /// the *current* owner has approved it.
    pub fn authorize(
        &self,
        env: &Env,
        caller: &Address,
        keeper: Option<&Address>,
    ) -> Result<(), ContractError> {
        if *caller == self.owner {
            return Ok(());
        }
        match keeper {
            Some(keeper) if caller == keeper && storage::keeper_approved(env, &self.owner) => {
                Ok(())
            }
            _ => Err(ContractError::Unauthorized),
        }
    }

    /// Writes the terminal status and burns the ownership record.
    pub fn seal(self, env: &Env, finalization: Finalization) -> LoanEntry<Sealed> {
        let mut loan = self.loan;
        loan.status = finalization.into();
        storage::write_loan(env, self.id, &loan);
        storage::remove_owner(env, self.id);

        LoanEntry {
            id: self.id,
            loan,
            owner: self.owner,
            _phase: PhantomData,
        }
    }
}
