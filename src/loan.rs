use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::{Dimensions, LoanId, LoanStatus, OfficerId};

/// contractual terms fixed at disbursement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest_rate: Rate,
    pub fee_amount: Money,
    pub disbursement_date: DateTime<Utc>,
    pub first_payment_due_date: Option<DateTime<Utc>>,
}

impl LoanTerms {
    /// validate and build loan terms, the only place malformed amounts are
    /// rejected
    pub fn new(
        principal: Money,
        interest_rate: Rate,
        fee_amount: Money,
        disbursement_date: DateTime<Utc>,
        first_payment_due_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        if principal.is_negative() {
            return Err(EngineError::InvalidPrincipal { amount: principal });
        }
        if interest_rate.is_negative() {
            return Err(EngineError::InvalidInterestRate {
                rate: interest_rate,
            });
        }
        if fee_amount.is_negative() {
            return Err(EngineError::InvalidFeeAmount { amount: fee_amount });
        }
        Ok(Self {
            principal,
            interest_rate,
            fee_amount,
            disbursement_date,
            first_payment_due_date,
        })
    }

    /// contractual interest over the life of the loan
    pub fn interest_expected(&self) -> Money {
        self.principal * self.interest_rate.as_decimal()
    }

    /// principal plus interest plus fees due over the life of the loan
    pub fn total_expected(&self) -> Money {
        self.principal + self.interest_expected() + self.fee_amount
    }
}

/// a loan under management
///
/// derived balances and dpd live in the loan's state record, written only by
/// the recompute path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub officer_id: OfficerId,
    pub terms: LoanTerms,
    pub status: LoanStatus,
    pub dimensions: Dimensions,
    /// due date derived from the payment schedule when the upstream book
    /// provides one, takes precedence over first_payment_due_date
    pub schedule_due_date: Option<DateTime<Utc>>,
    /// upstream-scored repayment timeliness, carried through for averages
    pub timeliness_score: Option<Decimal>,
    /// upstream-scored repayment health, carried through for averages
    pub repayment_health: Option<Decimal>,
}

impl Loan {
    pub fn new(
        id: LoanId,
        officer_id: OfficerId,
        terms: LoanTerms,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            id,
            officer_id,
            terms,
            status: LoanStatus::Active,
            dimensions,
            schedule_due_date: None,
            timeliness_score: None,
            repayment_health: None,
        }
    }

    /// effective first due date: schedule-derived when present, else the
    /// contractual first payment due date
    pub fn first_due_date(&self) -> Option<DateTime<Utc>> {
        self.schedule_due_date.or(self.terms.first_payment_due_date)
    }
}
