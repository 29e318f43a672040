use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::store::LoanRecord;
use crate::types::{Officer, OfficerId};

/// raw sums and counts over one officer's loan book, the inputs every
/// officer metric is derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerAggregates {
    pub officer_id: OfficerId,
    pub as_of: DateTime<Utc>,

    pub disbursed_count: u32,
    pub first_miss_count: u32,

    pub dpd_1_6_balance: Money,
    pub prev_dpd_1_6_balance: Money,
    pub moved_7_30_balance: Money,
    pub overdue_15d_balance: Money,
    /// every outstanding component over the whole book, kept under its
    /// historical reporting name
    pub amount_due_7d: Money,

    pub interest_collected: Money,
    pub fees_collected: Money,
    pub fees_due: Money,

    pub total_portfolio: Money,
    pub par15_mid_month: Money,

    pub active_loans_count: u32,
    pub avg_timeliness_score: Decimal,
    pub avg_repayment_health: Decimal,
    pub avg_days_since_last_repayment: Decimal,
    pub avg_loan_age_days: Decimal,
}

/// fold one officer's loan records into the aggregate row
///
/// delinquency buckets are projected to `as_of` so a batch pass sees every
/// loan on the same day, and the buckets overlap on purpose: a loan at
/// fifteen or more days past due sits in both the 7-30 balance and the
/// overdue balance
pub fn aggregate_officer(
    officer: &Officer,
    records: &[LoanRecord],
    prior_dpd_1_6_balance: Option<Money>,
    config: &EngineConfig,
    as_of: DateTime<Utc>,
) -> OfficerAggregates {
    let mut agg = OfficerAggregates {
        officer_id: officer.id,
        as_of,
        disbursed_count: records.len() as u32,
        first_miss_count: 0,
        dpd_1_6_balance: Money::ZERO,
        prev_dpd_1_6_balance: Money::ZERO,
        moved_7_30_balance: Money::ZERO,
        overdue_15d_balance: Money::ZERO,
        amount_due_7d: Money::ZERO,
        interest_collected: Money::ZERO,
        fees_collected: Money::ZERO,
        fees_due: Money::ZERO,
        total_portfolio: Money::ZERO,
        par15_mid_month: Money::ZERO,
        active_loans_count: 0,
        avg_timeliness_score: Decimal::ZERO,
        avg_repayment_health: Decimal::ZERO,
        avg_days_since_last_repayment: Decimal::ZERO,
        avg_loan_age_days: Decimal::ZERO,
    };

    let floor = config.activity.active_outstanding_floor;
    let mut timeliness = Averager::new();
    let mut health = Averager::new();
    let mut days_since = Averager::new();
    let mut loan_age = Averager::new();

    for record in records {
        let state = &record.state;
        let dpd = state.dpd_as_of(as_of);

        if state.fimr_tagged {
            agg.first_miss_count += 1;
        }
        if (1..=6).contains(&dpd) {
            agg.dpd_1_6_balance += state.principal_outstanding;
        }
        if (7..=30).contains(&dpd) {
            agg.moved_7_30_balance += state.principal_outstanding;
        }
        if dpd >= 15 {
            agg.overdue_15d_balance += state.principal_outstanding;
        }
        agg.amount_due_7d +=
            state.principal_outstanding + state.interest_outstanding + state.fees_outstanding;

        agg.interest_collected += state.total_interest_paid;
        agg.fees_collected += state.total_fees_paid;
        agg.fees_due += record.loan.terms.fee_amount;
        agg.total_portfolio += state.principal_outstanding;

        // behavior averages only look at loans with a live balance
        if state.total_outstanding > floor {
            agg.active_loans_count += 1;
            if let Some(score) = record.loan.timeliness_score {
                timeliness.push(score);
            }
            if let Some(score) = record.loan.repayment_health {
                health.push(score);
            }
            if let Some(days) = state.days_since_last_repayment {
                days_since.push(Decimal::from(days));
            }
            loan_age.push(Decimal::from(state.loan_age_days));
        }
    }

    agg.par15_mid_month = agg.total_portfolio;
    agg.prev_dpd_1_6_balance = prior_dpd_1_6_balance.unwrap_or(agg.dpd_1_6_balance);
    agg.avg_timeliness_score = timeliness.mean();
    agg.avg_repayment_health = health.mean();
    agg.avg_days_since_last_repayment = days_since.mean();
    agg.avg_loan_age_days = loan_age.mean();

    debug!(
        officer_id = %officer.id,
        loans = records.len(),
        total_portfolio = %agg.total_portfolio,
        "aggregated officer loan book"
    );

    agg
}

/// running mean that ignores absent values, matching how the reporting
/// queries average nullable columns
struct Averager {
    sum: Decimal,
    count: u32,
}

impl Averager {
    fn new() -> Self {
        Self {
            sum: Decimal::ZERO,
            count: 0,
        }
    }

    fn push(&mut self, value: Decimal) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            self.sum / Decimal::from(self.count)
        }
    }
}
