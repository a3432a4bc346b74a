//! # Account Store
//!
//! Seam verso lo store delle identità: saldo crediti e piano dell'account.
//! Il controllo e l'addebito sono un'unica operazione atomica per account.
//!
//! `InMemoryAccountStore` è l'implementazione usata dalla CLI e dai test.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// Subscription tier of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl PlanTier {
    pub fn includes_critical_css(&self) -> bool {
        *self == PlanTier::Pro
    }

    pub fn includes_node_audit(&self) -> bool {
        matches!(self, PlanTier::Premium | PlanTier::Pro)
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "premium" => Ok(PlanTier::Premium),
            "pro" => Ok(PlanTier::Pro),
            other => Err(format!("unknown plan '{}' (expected free, premium or pro)", other)),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanTier::Free => "free",
            PlanTier::Premium => "premium",
            PlanTier::Pro => "pro",
        })
    }
}

/// Credit balance and plan of the accounts that submit jobs
pub trait AccountStore: Send + Sync {
    /// Check `credits >= amount` and subtract it in one step, returning the new balance
    fn try_debit(&self, account_id: &str, amount: u32) -> EngineResult<u32>;

    fn credits(&self, account_id: &str) -> EngineResult<u32>;

    fn plan(&self, account_id: &str) -> EngineResult<PlanTier>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Account {
    credits: u32,
    plan: PlanTier,
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a single account
    pub fn with_account(account_id: &str, credits: u32, plan: PlanTier) -> Self {
        let store = Self::new();
        store.upsert(account_id, credits, plan);
        store
    }

    pub fn upsert(&self, account_id: &str, credits: u32, plan: PlanTier) {
        self.lock()
            .insert(account_id.to_string(), Account { credits, plan });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn account(&self, account_id: &str) -> EngineResult<Account> {
        self.lock()
            .get(account_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownAccount(account_id.to_string()))
    }
}

impl AccountStore for InMemoryAccountStore {
    fn try_debit(&self, account_id: &str, amount: u32) -> EngineResult<u32> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| EngineError::UnknownAccount(account_id.to_string()))?;

        if account.credits < amount {
            return Err(EngineError::InsufficientCredits);
        }
        account.credits -= amount;
        Ok(account.credits)
    }

    fn credits(&self, account_id: &str) -> EngineResult<u32> {
        self.account(account_id).map(|account| account.credits)
    }

    fn plan(&self, account_id: &str) -> EngineResult<PlanTier> {
        self.account(account_id).map(|account| account.plan)
    }
}
