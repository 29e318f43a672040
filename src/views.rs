use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::engine::MetricsSnapshot;
use crate::metrics::bands::DpdStatus;
use crate::metrics::portfolio::{OfficerScorecard, PortfolioMetrics};
use crate::store::LoanRecord;
use crate::types::{Dimensions, LoanId, LoanStatus, OfficerId};

/// serializable view of a loan's book position
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub officer_id: OfficerId,
    pub status: LoanStatus,
    pub disbursement_date: DateTime<Utc>,
    pub first_due_date: Option<DateTime<Utc>>,
    pub dimensions: Dimensions,
    pub financial: FinancialView,
    pub repayment: RepaymentView,
    pub delinquency: DelinquencyView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinancialView {
    pub principal: Money,
    pub interest_rate: Rate,
    pub interest_expected: Money,
    pub fee_amount: Money,
    pub total_expected: Money,
    pub principal_outstanding: Money,
    pub interest_outstanding: Money,
    pub fees_outstanding: Money,
    pub total_outstanding: Money,
    pub actual_outstanding: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepaymentView {
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    pub total_fees_paid: Money,
    pub total_repaid: Money,
    pub repayment_count: u32,
    pub reversed_count: u32,
    pub first_payment_received_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DelinquencyView {
    pub current_dpd: i64,
    pub days_since_due: i64,
    pub max_dpd_ever: i64,
    pub dpd_status: String,
    pub early_indicator: bool,
    pub first_payment_missed: bool,
    pub fimr_tagged: bool,
}

impl LoanView {
    pub fn from_record(record: &LoanRecord) -> Self {
        let terms = &record.loan.terms;
        let state = &record.state;
        let active = record.ledger.active().count() as u32;
        LoanView {
            id: record.loan.id,
            officer_id: record.loan.officer_id,
            status: record.loan.status,
            disbursement_date: terms.disbursement_date,
            first_due_date: state.first_due_date,
            dimensions: record.loan.dimensions.clone(),
            financial: FinancialView {
                principal: terms.principal,
                interest_rate: terms.interest_rate,
                interest_expected: terms.interest_expected(),
                fee_amount: terms.fee_amount,
                total_expected: terms.total_expected(),
                principal_outstanding: state.principal_outstanding,
                interest_outstanding: state.interest_outstanding,
                fees_outstanding: state.fees_outstanding,
                total_outstanding: state.total_outstanding,
                actual_outstanding: state.actual_outstanding,
            },
            repayment: RepaymentView {
                total_principal_paid: state.total_principal_paid,
                total_interest_paid: state.total_interest_paid,
                total_fees_paid: state.total_fees_paid,
                total_repaid: state.total_repaid,
                repayment_count: active,
                reversed_count: record.ledger.len() as u32 - active,
                first_payment_received_date: state.first_payment_received_date,
                last_payment_date: state.last_payment_date,
            },
            delinquency: DelinquencyView {
                current_dpd: state.current_dpd,
                days_since_due: state.days_since_due,
                max_dpd_ever: state.max_dpd_ever,
                dpd_status: DpdStatus::for_dpd(state.current_dpd).to_string(),
                early_indicator: state.early_indicator,
                first_payment_missed: state.first_payment_missed,
                fimr_tagged: state.fimr_tagged,
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// one officer's scorecard flattened for the reporting layer
#[derive(Debug, Serialize, Deserialize)]
pub struct ScorecardView {
    pub officer_id: OfficerId,
    pub name: String,
    pub branch: String,
    pub region: String,
    pub as_of: DateTime<Utc>,
    pub total_portfolio: Money,
    pub active_loans: u32,
    pub fimr: Decimal,
    pub slippage: Decimal,
    pub roll_rate: Decimal,
    pub frr: Decimal,
    pub ayr: Decimal,
    pub ayr_band: String,
    pub yield_collected: Money,
    pub porr: Decimal,
    pub on_time_rate: Decimal,
    pub repayment_delay_rate: Decimal,
    pub risk_score: i32,
    pub risk_band: String,
    pub dqi: i32,
}

impl ScorecardView {
    pub fn from_scorecard(card: &OfficerScorecard) -> Self {
        let m = &card.metrics;
        ScorecardView {
            officer_id: card.officer.id,
            name: card.officer.name.clone(),
            branch: card.officer.branch.clone(),
            region: card.officer.region.clone(),
            as_of: m.as_of,
            total_portfolio: card.aggregates.total_portfolio,
            active_loans: card.aggregates.active_loans_count,
            fimr: m.fimr,
            slippage: m.slippage,
            roll_rate: m.roll_rate,
            frr: m.frr,
            ayr: m.ayr,
            ayr_band: m.ayr_band.to_string(),
            yield_collected: m.yield_collected,
            porr: m.porr,
            on_time_rate: m.on_time_rate,
            repayment_delay_rate: m.repayment_delay_rate,
            risk_score: m.risk_score,
            risk_band: m.risk_band.to_string(),
            dqi: m.dqi,
        }
    }
}

/// a published metrics pass in interchange form
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotView {
    pub as_of: DateTime<Utc>,
    pub portfolio: PortfolioMetrics,
    pub scorecards: Vec<ScorecardView>,
}

impl SnapshotView {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        SnapshotView {
            as_of: snapshot.as_of,
            portfolio: snapshot.portfolio.clone(),
            scorecards: snapshot
                .scorecards
                .iter()
                .map(ScorecardView::from_scorecard)
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
