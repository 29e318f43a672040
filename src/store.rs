use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, TryLockError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{EngineError, Result};
use crate::ledger::RepaymentLedger;
use crate::loan::Loan;
use crate::state::LoanState;
use crate::types::{LoanId, Officer, OfficerId};

/// a loan with its ledger and current derived state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan: Loan,
    pub ledger: RepaymentLedger,
    pub state: LoanState,
}

/// storage behind the engine
///
/// reads hand out snapshots, mutations run inside the per-loan critical
/// section so two writers on the same loan never interleave
pub trait StateStore: Send + Sync {
    fn upsert_officer(&self, officer: Officer);
    fn officer(&self, id: OfficerId) -> Option<Officer>;
    fn officers(&self) -> Vec<Officer>;

    fn insert_loan(&self, record: LoanRecord) -> Result<()>;
    fn loan(&self, id: LoanId) -> Result<LoanRecord>;
    fn loans(&self) -> Vec<LoanRecord>;
    fn loans_for_officer(&self, officer_id: OfficerId) -> Vec<LoanRecord>;

    /// run `apply` while holding the loan's write lock
    fn update_loan<R, F>(&self, id: LoanId, apply: F) -> Result<R>
    where
        F: FnOnce(&mut LoanRecord) -> Result<R>;

    /// non-blocking variant, fails with `LoanBusy` when another writer holds
    /// the loan
    fn try_update_loan<R, F>(&self, id: LoanId, apply: F) -> Result<R>
    where
        F: FnOnce(&mut LoanRecord) -> Result<R>;
}

/// in-memory store with one mutex per loan
#[derive(Debug, Default)]
pub struct MemoryStore {
    officers: RwLock<HashMap<OfficerId, Officer>>,
    loans: RwLock<HashMap<LoanId, Arc<Mutex<LoanRecord>>>>,
    officer_index: RwLock<HashMap<OfficerId, Vec<LoanId>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn loan_handle(&self, id: LoanId) -> Result<Arc<Mutex<LoanRecord>>> {
        let loans = read_lock(&self.loans);
        loans
            .get(&id)
            .cloned()
            .ok_or(EngineError::LoanNotFound { id })
    }
}

impl StateStore for MemoryStore {
    fn upsert_officer(&self, officer: Officer) {
        write_lock(&self.officers).insert(officer.id, officer);
    }

    fn officer(&self, id: OfficerId) -> Option<Officer> {
        read_lock(&self.officers).get(&id).cloned()
    }

    fn officers(&self) -> Vec<Officer> {
        read_lock(&self.officers).values().cloned().collect()
    }

    fn insert_loan(&self, record: LoanRecord) -> Result<()> {
        let id = record.loan.id;
        let officer_id = record.loan.officer_id;
        let mut loans = write_lock(&self.loans);
        if loans.contains_key(&id) {
            return Err(EngineError::DuplicateLoan { id });
        }
        loans.insert(id, Arc::new(Mutex::new(record)));
        drop(loans);
        write_lock(&self.officer_index)
            .entry(officer_id)
            .or_default()
            .push(id);
        Ok(())
    }

    fn loan(&self, id: LoanId) -> Result<LoanRecord> {
        let handle = self.loan_handle(id)?;
        let guard = lock(&handle);
        Ok(guard.clone())
    }

    fn loans(&self) -> Vec<LoanRecord> {
        let handles: Vec<_> = read_lock(&self.loans).values().cloned().collect();
        handles.iter().map(|h| lock(h).clone()).collect()
    }

    fn loans_for_officer(&self, officer_id: OfficerId) -> Vec<LoanRecord> {
        let ids = read_lock(&self.officer_index)
            .get(&officer_id)
            .cloned()
            .unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.loan_handle(id).ok())
            .map(|h| lock(&h).clone())
            .collect()
    }

    fn update_loan<R, F>(&self, id: LoanId, apply: F) -> Result<R>
    where
        F: FnOnce(&mut LoanRecord) -> Result<R>,
    {
        let handle = self.loan_handle(id)?;
        let mut guard = lock(&handle);
        apply(&mut guard)
    }

    fn try_update_loan<R, F>(&self, id: LoanId, apply: F) -> Result<R>
    where
        F: FnOnce(&mut LoanRecord) -> Result<R>,
    {
        let handle = self.loan_handle(id)?;
        let mut guard = match handle.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(EngineError::LoanBusy { id }),
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!(loan_id = %id, "loan lock poisoned by a panicked writer, recovering");
                poisoned.into_inner()
            }
        };
        apply(&mut guard)
    }
}

// poisoning means a writer panicked mid-update; the record is still a valid
// snapshot because every mutation rewrites the derived tuple whole
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!("store map lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!("store map lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("loan lock poisoned by a panicked writer, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::decimal::{Money, Rate};
    use crate::loan::LoanTerms;
    use crate::state::compute_state;
    use crate::types::Dimensions;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(officer_id: OfficerId) -> LoanRecord {
        let terms = LoanTerms::new(
            Money::from_major(50_000),
            Rate::from_percentage(20),
            Money::from_major(1_000),
            Utc::now(),
            None,
        )
        .unwrap();
        let loan = Loan::new(Uuid::new_v4(), officer_id, terms, Dimensions::default());
        let ledger = RepaymentLedger::new();
        let state = compute_state(&loan, &ledger, 0, &EngineConfig::standard(), Utc::now());
        LoanRecord {
            loan,
            ledger,
            state,
        }
    }

    #[test]
    fn test_insert_and_fetch() {
        let store = MemoryStore::new();
        let officer_id = Uuid::new_v4();
        let rec = record(officer_id);
        let loan_id = rec.loan.id;

        store.insert_loan(rec).unwrap();
        let fetched = store.loan(loan_id).unwrap();
        assert_eq!(fetched.loan.id, loan_id);
        assert_eq!(store.loans_for_officer(officer_id).len(), 1);
        assert!(store.loans_for_officer(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_duplicate_loan_rejected() {
        let store = MemoryStore::new();
        let rec = record(Uuid::new_v4());
        let dup = rec.clone();
        store.insert_loan(rec).unwrap();
        assert!(matches!(
            store.insert_loan(dup),
            Err(EngineError::DuplicateLoan { .. })
        ));
    }

    #[test]
    fn test_unknown_loan() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.loan(Uuid::new_v4()),
            Err(EngineError::LoanNotFound { .. })
        ));
    }

    #[test]
    fn test_snapshot_reads_are_isolated() {
        let store = MemoryStore::new();
        let rec = record(Uuid::new_v4());
        let loan_id = rec.loan.id;
        store.insert_loan(rec).unwrap();

        let before = store.loan(loan_id).unwrap();
        store
            .update_loan(loan_id, |record| {
                record.state.max_dpd_ever = 30;
                Ok(())
            })
            .unwrap();

        assert_eq!(before.state.max_dpd_ever, 0);
        assert_eq!(store.loan(loan_id).unwrap().state.max_dpd_ever, 30);
    }

    #[test]
    fn test_try_update_fails_while_locked() {
        let store = MemoryStore::new();
        let rec = record(Uuid::new_v4());
        let loan_id = rec.loan.id;
        store.insert_loan(rec).unwrap();

        store
            .update_loan(loan_id, |_| {
                // the same loan is already locked by this writer
                assert!(matches!(
                    store.try_update_loan(loan_id, |_| Ok(())),
                    Err(EngineError::LoanBusy { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_officer_upsert() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let officer = Officer {
            id,
            name: "Bisi".to_string(),
            email: None,
            region: "North Central".to_string(),
            branch: "Kubwa".to_string(),
            channel: None,
            user_type: Some("AGENT".to_string()),
            vertical_lead: None,
        };
        store.upsert_officer(officer.clone());
        assert_eq!(store.officer(id), Some(officer));
        assert_eq!(store.officers().len(), 1);
    }
}
