use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::errors::ContractError;
use crate::types::{EngineConfig, Loan};

const CONFIG: Symbol = symbol_short!("config");

const INSTANCE_BUMP: u32 = 518_400;
const INSTANCE_THRESHOLD: u32 = INSTANCE_BUMP - 17_280;
const LOAN_BUMP: u32 = 518_400;
const LOAN_THRESHOLD: u32 = LOAN_BUMP - 17_280;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Loan(u64),
    Owner(u64),
    KeeperApproved(Address),
    Swapper(Address),
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&CONFIG)
}

pub fn read_config(env: &Env) -> Result<EngineConfig, ContractError> {
    env.storage()
        .instance()
        .get(&CONFIG)
        .ok_or(ContractError::NotInitialized)
}

pub fn write_config(env: &Env, config: &EngineConfig) {
    env.storage().instance().set(&CONFIG, config);
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_THRESHOLD, INSTANCE_BUMP);
}

pub fn read_loan(env: &Env, loan_id: u64) -> Option<Loan> {
    env.storage().persistent().get(&DataKey::Loan(loan_id))
}

pub fn write_loan(env: &Env, loan_id: u64, loan: &Loan) {
    let key = DataKey::Loan(loan_id);
    env.storage().persistent().set(&key, loan);
    env.storage()
        .persistent()
        .extend_ttl(&key, LOAN_THRESHOLD, LOAN_BUMP);
}

pub fn read_owner(env: &Env, loan_id: u64) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Owner(loan_id))
}

pub fn write_owner(env: &Env, loan_id: u64, owner: &Address) {
    let key = DataKey::Owner(loan_id);
    env.storage().persistent().set(&key, owner);
    env.storage()
        .persistent()
        .extend_ttl(&key, LOAN_THRESHOLD, LOAN_BUMP);
}

pub fn remove_owner(env: &Env, loan_id: u64) {
    env.storage().persistent().remove(&DataKey::Owner(loan_id));
}

/// Keeper approval is keyed by owner, not by loan: a new owner starts
/// without it.
pub fn keeper_approved(env: &Env, owner: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::KeeperApproved(owner.clone()))
        .unwrap_or(false)
}

pub fn set_keeper_approved(env: &Env, owner: &Address, enabled: bool) {
    let key = DataKey::KeeperApproved(owner.clone());
    if enabled {
        env.storage().persistent().set(&key, &true);
        env.storage()
            .persistent()
            .extend_ttl(&key, LOAN_THRESHOLD, LOAN_BUMP);
    } else {
        env.storage().persistent().remove(&key);
    }
}

pub fn swapper_allowed(env: &Env, swapper: &Address) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Swapper(swapper.clone()))
        .unwrap_or(false)
}

pub fn set_swapper_allowed(env: &Env, swapper: &Address, allowed: bool) {
    let key = DataKey::Swapper(swapper.clone());
    if allowed {
        env.storage().instance().set(&key, &true);
    } else {
        env.storage().instance().remove(&key);
    }
}
