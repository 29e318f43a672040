use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::{allocate, RepaymentAllocation};
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::ledger::RepaymentLedger;
use crate::loan::Loan;

/// whole calendar days from `from` to `to`
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

/// derived financial state of a loan
///
/// written only by recomputation, never edited field by field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanState {
    // paid totals from proportional allocation
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    pub total_fees_paid: Money,
    pub total_repaid: Money,

    // outstanding components, any of which may run negative on overpayment
    pub principal_outstanding: Money,
    pub interest_outstanding: Money,
    pub fees_outstanding: Money,
    pub total_outstanding: Money,
    /// externally visible amount owed, floored at zero
    pub actual_outstanding: Money,

    // dates
    pub first_due_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub first_payment_received_date: Option<DateTime<Utc>>,

    // delinquency
    pub current_dpd: i64,
    pub days_since_due: i64,
    pub max_dpd_ever: i64,
    pub early_indicator: bool,

    // repayment behavior
    pub loan_age_days: i64,
    pub days_since_last_repayment: Option<i64>,
    pub repayment_delay_rate: Decimal,

    // first installment tagging
    pub first_payment_missed: bool,
    pub fimr_tagged: bool,

    pub computed_at: DateTime<Utc>,
}

impl LoanState {
    /// re-derive dpd against a different reference date without touching the
    /// ledger, used by the batch pass so one timestamp governs a whole sweep
    pub fn dpd_as_of(&self, as_of: DateTime<Utc>) -> i64 {
        if !self.actual_outstanding.is_positive() {
            return 0;
        }
        let Some(due) = self.first_due_date else {
            return 0;
        };
        match self.last_payment_date {
            Some(last) => days_between(last, as_of).max(0),
            None => days_between(due, as_of).max(0),
        }
    }
}

/// recompute the full derived tuple from the loan's terms and its
/// non-reversed repayments
///
/// pure function of its inputs: insertion order of the ledger never changes
/// the result, and recomputing with an unchanged ledger reproduces the same
/// state. `prior_max_dpd` carries the monotone high-water mark across calls.
pub fn compute_state(
    loan: &Loan,
    ledger: &RepaymentLedger,
    prior_max_dpd: i64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> LoanState {
    let terms = &loan.terms;

    let mut paid = RepaymentAllocation::default();
    for repayment in ledger.active() {
        paid += allocate(terms, repayment.amount);
    }
    let total_repaid = ledger.total_paid();

    let principal_outstanding = terms.principal - paid.to_principal;
    let interest_outstanding = terms.interest_expected() - paid.to_interest;
    let fees_outstanding = terms.fee_amount - paid.to_fees;
    let total_outstanding = principal_outstanding + interest_outstanding + fees_outstanding;
    let actual_outstanding = total_outstanding.floor_zero();

    let first_due_date = loan.first_due_date();
    let last_payment_date = ledger.last_payment_date();
    let first_payment_received_date = ledger.first_payment_date();

    // terminal condition first: a settled loan is never overdue
    let current_dpd = if !actual_outstanding.is_positive() {
        0
    } else {
        days_overdue(first_due_date, last_payment_date, now)
    };
    // same date logic, deliberately not floored by payoff
    let days_since_due = days_overdue(first_due_date, last_payment_date, now);

    let max_dpd_ever = prior_max_dpd.max(current_dpd);
    let early_indicator = (1..=6).contains(&current_dpd);

    let loan_age_days = days_between(terms.disbursement_date, now).max(0);
    let days_since_last_repayment = last_payment_date.map(|d| days_between(d, now).max(0));
    let repayment_delay_rate = delay_rate(
        loan_age_days,
        days_since_last_repayment,
        current_dpd,
        config.scoring.delay_normalization,
    );

    let first_payment_missed = match (first_payment_received_date, terms.first_payment_due_date) {
        (Some(received), Some(due)) => received.date_naive() > due.date_naive(),
        (None, _) => true,
        (Some(_), None) => false,
    };
    let fimr_tagged = match terms.first_payment_due_date {
        None => true,
        Some(due) => match first_payment_received_date {
            Some(received) => received.date_naive() > due.date_naive(),
            None => due.date_naive() < now.date_naive(),
        },
    };

    LoanState {
        total_principal_paid: paid.to_principal,
        total_interest_paid: paid.to_interest,
        total_fees_paid: paid.to_fees,
        total_repaid,
        principal_outstanding,
        interest_outstanding,
        fees_outstanding,
        total_outstanding,
        actual_outstanding,
        first_due_date,
        last_payment_date,
        first_payment_received_date,
        current_dpd,
        days_since_due,
        max_dpd_ever,
        early_indicator,
        loan_age_days,
        days_since_last_repayment,
        repayment_delay_rate,
        first_payment_missed,
        fimr_tagged,
        computed_at: now,
    }
}

/// days overdue under the shared due-date precedence: nothing due yet is
/// never overdue, a payment restarts the clock from its date
fn days_overdue(
    first_due_date: Option<DateTime<Utc>>,
    last_payment_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    let Some(due) = first_due_date else {
        return 0;
    };
    match last_payment_date {
        Some(last) => days_between(last, now).max(0),
        None => days_between(due, now).max(0),
    }
}

fn delay_rate(
    loan_age_days: i64,
    days_since_last_repayment: Option<i64>,
    current_dpd: i64,
    normalization: Decimal,
) -> Decimal {
    if loan_age_days <= 0 {
        return Decimal::ZERO;
    }
    let age = Decimal::from(loan_age_days);
    let behind = match days_since_last_repayment {
        Some(days) => (Decimal::from(days) + Decimal::from(current_dpd)) / Decimal::from(2),
        None => Decimal::from(current_dpd),
    };
    (Decimal::ONE - (behind / age) / normalization) * Decimal::from(100)
}
