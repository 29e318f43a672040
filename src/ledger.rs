use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::types::{LoanId, RepaymentId};

/// a single repayment event, immutable once recorded except for the
/// reversal flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: RepaymentId,
    pub loan_id: LoanId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub is_reversed: bool,
    pub recorded_at: DateTime<Utc>,
}

impl Repayment {
    /// validate and build a repayment event
    pub fn new(
        id: RepaymentId,
        loan_id: LoanId,
        amount: Money,
        payment_date: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self> {
        if amount.is_zero() || amount.is_negative() {
            return Err(EngineError::InvalidPaymentAmount { amount });
        }
        Ok(Self {
            id,
            loan_id,
            amount,
            payment_date,
            is_reversed: false,
            recorded_at,
        })
    }
}

/// append-only repayment history for one loan
///
/// reversed entries stay in the ledger for audit and are skipped by every
/// derived computation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepaymentLedger {
    entries: Vec<Repayment>,
}

impl RepaymentLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// append a repayment, rejecting duplicate ids
    pub fn append(&mut self, repayment: Repayment) -> Result<()> {
        if self.entries.iter().any(|r| r.id == repayment.id) {
            return Err(EngineError::DuplicateRepayment { id: repayment.id });
        }
        self.entries.push(repayment);
        Ok(())
    }

    /// flag a repayment as reversed, keeping it in the ledger
    pub fn reverse(&mut self, id: RepaymentId) -> Result<&Repayment> {
        let entry = self
            .entries
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(EngineError::RepaymentNotFound { id })?;
        if entry.is_reversed {
            return Err(EngineError::RepaymentAlreadyReversed { id });
        }
        entry.is_reversed = true;
        Ok(entry)
    }

    /// non-reversed repayments, the ones derived state is computed from
    pub fn active(&self) -> impl Iterator<Item = &Repayment> {
        self.entries.iter().filter(|r| !r.is_reversed)
    }

    /// full audit view including reversed entries
    pub fn entries(&self) -> &[Repayment] {
        &self.entries
    }

    /// sum of non-reversed repayment amounts
    pub fn total_paid(&self) -> Money {
        self.active().map(|r| r.amount).sum()
    }

    /// latest non-reversed payment date
    pub fn last_payment_date(&self) -> Option<DateTime<Utc>> {
        self.active().map(|r| r.payment_date).max()
    }

    /// earliest non-reversed payment date
    pub fn first_payment_date(&self) -> Option<DateTime<Utc>> {
        self.active().map(|r| r.payment_date).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn repayment(amount: i64, days_ago: i64, now: DateTime<Utc>) -> Repayment {
        Repayment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(amount),
            now - chrono::Duration::days(days_ago),
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let now = Utc::now();
        assert!(Repayment::new(Uuid::new_v4(), Uuid::new_v4(), Money::ZERO, now, now).is_err());
        assert!(
            Repayment::new(Uuid::new_v4(), Uuid::new_v4(), Money::from_major(-50), now, now)
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let now = Utc::now();
        let mut ledger = RepaymentLedger::new();
        let r = repayment(1_000, 3, now);
        let dup = r.clone();
        ledger.append(r).unwrap();
        assert!(matches!(
            ledger.append(dup),
            Err(EngineError::DuplicateRepayment { .. })
        ));
    }

    #[test]
    fn test_reversal_excluded_from_totals() {
        let now = Utc::now();
        let mut ledger = RepaymentLedger::new();
        let r1 = repayment(1_000, 5, now);
        let r2 = repayment(500, 2, now);
        let r2_id = r2.id;
        ledger.append(r1).unwrap();
        ledger.append(r2).unwrap();
        assert_eq!(ledger.total_paid(), Money::from_major(1_500));

        ledger.reverse(r2_id).unwrap();
        assert_eq!(ledger.total_paid(), Money::from_major(1_000));
        // still present for audit
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.last_payment_date(), Some(now - chrono::Duration::days(5)));
    }

    #[test]
    fn test_double_reversal_rejected() {
        let now = Utc::now();
        let mut ledger = RepaymentLedger::new();
        let r = repayment(1_000, 1, now);
        let id = r.id;
        ledger.append(r).unwrap();
        ledger.reverse(id).unwrap();
        assert!(matches!(
            ledger.reverse(id),
            Err(EngineError::RepaymentAlreadyReversed { .. })
        ));
    }

    #[test]
    fn test_reverse_unknown_id() {
        let mut ledger = RepaymentLedger::new();
        assert!(matches!(
            ledger.reverse(Uuid::new_v4()),
            Err(EngineError::RepaymentNotFound { .. })
        ));
    }

    #[test]
    fn test_payment_date_bounds() {
        let now = Utc::now();
        let mut ledger = RepaymentLedger::new();
        assert_eq!(ledger.last_payment_date(), None);
        assert_eq!(ledger.first_payment_date(), None);

        ledger.append(repayment(100, 10, now)).unwrap();
        ledger.append(repayment(100, 1, now)).unwrap();
        ledger.append(repayment(100, 6, now)).unwrap();
        assert_eq!(ledger.first_payment_date(), Some(now - chrono::Duration::days(10)));
        assert_eq!(ledger.last_payment_date(), Some(now - chrono::Duration::days(1)));
    }
}
