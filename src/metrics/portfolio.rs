use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregates::OfficerAggregates;
use crate::config::{EngineConfig, SummaryBasis};
use crate::decimal::Money;
use crate::loan::Loan;
use crate::metrics::calculator::OfficerMetrics;
use crate::store::LoanRecord;
use crate::types::{Officer, OfficerId};

/// one officer's full result row from a metrics pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerScorecard {
    pub officer: Officer,
    pub aggregates: OfficerAggregates,
    pub metrics: OfficerMetrics,
}

/// best-yield officer highlighted on the portfolio view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOfficer {
    pub officer_id: OfficerId,
    pub name: String,
    pub ayr: Decimal,
}

/// portfolio-level rollup of the officer scorecards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_officers: u32,
    pub total_loans: u32,
    pub total_portfolio: Money,
    pub total_overdue_15d: Money,
    pub avg_dqi: i32,
    pub avg_ayr: Decimal,
    pub avg_risk_score: i32,
    pub top_officer: Option<TopOfficer>,
    pub watchlist_count: u32,
    pub watchlist_portfolio: Money,
    pub avg_repayment_delay_rate: Decimal,
    pub at_risk_officers_count: u32,
    pub at_risk_officers_percentage: Decimal,
}

/// fold officer scorecards into the portfolio rollup
///
/// the yield average deliberately counts zero-exposure officers, so a book
/// of mostly settled officers averages toward zero
pub fn rollup_portfolio(scorecards: &[OfficerScorecard], config: &EngineConfig) -> PortfolioMetrics {
    if scorecards.is_empty() {
        return PortfolioMetrics::default();
    }

    let mut out = PortfolioMetrics {
        total_officers: scorecards.len() as u32,
        ..PortfolioMetrics::default()
    };

    let mut total_dqi: i64 = 0;
    let mut total_risk: i64 = 0;
    let mut total_ayr = Decimal::ZERO;
    let mut top_ayr = Decimal::ZERO;
    let mut delay_sum = Decimal::ZERO;
    let mut delay_count: u32 = 0;

    for card in scorecards {
        let m = &card.metrics;
        let a = &card.aggregates;

        out.total_overdue_15d += a.overdue_15d_balance;
        out.total_loans += a.disbursed_count;
        out.total_portfolio += a.total_portfolio;
        total_dqi += i64::from(m.dqi);
        total_risk += i64::from(m.risk_score);
        total_ayr += m.ayr;

        // strictly greater, so ties keep the earliest officer and a
        // zero-yield pass highlights nobody
        if m.ayr > top_ayr {
            top_ayr = m.ayr;
            out.top_officer = Some(TopOfficer {
                officer_id: card.officer.id,
                name: card.officer.name.clone(),
                ayr: m.ayr,
            });
        }

        if m.risk_band.is_watchlisted() {
            out.watchlist_count += 1;
            out.watchlist_portfolio += a.total_portfolio;
        }

        if m.repayment_delay_rate != Decimal::ZERO {
            delay_sum += m.repayment_delay_rate;
            delay_count += 1;
        }

        if a.avg_days_since_last_repayment > config.activity.at_risk_days_since_repayment
            && a.avg_loan_age_days > config.activity.at_risk_loan_age_days
        {
            out.at_risk_officers_count += 1;
        }
    }

    let officer_count = i64::from(out.total_officers);
    out.avg_dqi = (total_dqi / officer_count) as i32;
    out.avg_risk_score = (total_risk / officer_count) as i32;
    out.avg_ayr = total_ayr / Decimal::from(out.total_officers);
    if delay_count > 0 {
        out.avg_repayment_delay_rate = delay_sum / Decimal::from(delay_count);
    }
    out.at_risk_officers_percentage = Decimal::from(out.at_risk_officers_count)
        / Decimal::from(out.total_officers)
        * Decimal::ONE_HUNDRED;

    out
}

/// optional equality filters over loan dimensions, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryFilters {
    pub branch: Option<String>,
    pub region: Option<String>,
    pub channel: Option<String>,
    pub user_type: Option<String>,
    pub wave: Option<String>,
}

impl SummaryFilters {
    pub fn matches(&self, loan: &Loan) -> bool {
        let d = &loan.dimensions;
        self.branch.as_ref().map_or(true, |b| &d.branch == b)
            && self.region.as_ref().map_or(true, |r| &d.region == r)
            && self
                .channel
                .as_ref()
                .map_or(true, |c| d.channel.as_deref() == Some(c.as_str()))
            && self
                .user_type
                .as_ref()
                .map_or(true, |u| d.user_type.as_deref() == Some(u.as_str()))
            && self
                .wave
                .as_ref()
                .map_or(true, |w| d.wave.as_deref() == Some(w.as_str()))
    }
}

fn basis_amount(basis: SummaryBasis, record: &LoanRecord) -> Money {
    match basis {
        SummaryBasis::Outstanding => record.state.principal_outstanding,
        SummaryBasis::Disbursed => record.loan.terms.principal,
    }
}

/// grouped summary row, one per branch and region pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub branch: String,
    pub region: String,
    pub portfolio_total: Money,
    pub overdue_15d: Money,
    pub par15_ratio: Decimal,
    pub active_loans: u32,
    pub total_officers: u32,
}

/// filtered portfolio summary with per-branch rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub branches: Vec<BranchSummary>,
    pub portfolio_total: Money,
    pub overdue_15d: Money,
    pub par15_ratio: Decimal,
    pub active_loans: u32,
    pub total_officers: u32,
}

#[derive(Default)]
struct SummaryAccumulator {
    portfolio_total: Money,
    overdue_15d: Money,
    loans: u32,
    officers: HashSet<OfficerId>,
}

impl SummaryAccumulator {
    fn push(&mut self, record: &LoanRecord, basis: SummaryBasis, as_of: DateTime<Utc>) {
        self.portfolio_total += basis_amount(basis, record);
        if record.state.dpd_as_of(as_of) >= 15 {
            self.overdue_15d += record.state.actual_outstanding;
        }
        self.loans += 1;
        self.officers.insert(record.loan.officer_id);
    }

    fn par15_ratio(&self) -> Decimal {
        self.overdue_15d.ratio_of(self.portfolio_total)
    }
}

/// group filtered loans by branch and region and summarize each group
///
/// a filter matching nothing returns an all-zero summary with no rows, never
/// an error
pub fn summarize_portfolio(
    records: &[LoanRecord],
    filters: &SummaryFilters,
    basis: SummaryBasis,
    as_of: DateTime<Utc>,
) -> PortfolioSummary {
    let mut totals = SummaryAccumulator::default();
    let mut groups: BTreeMap<(String, String), SummaryAccumulator> = BTreeMap::new();

    for record in records.iter().filter(|r| filters.matches(&r.loan)) {
        totals.push(record, basis, as_of);
        let key = (
            record.loan.dimensions.branch.clone(),
            record.loan.dimensions.region.clone(),
        );
        groups.entry(key).or_default().push(record, basis, as_of);
    }

    let branches = groups
        .into_iter()
        .map(|((branch, region), acc)| BranchSummary {
            branch,
            region,
            portfolio_total: acc.portfolio_total,
            overdue_15d: acc.overdue_15d,
            par15_ratio: acc.par15_ratio(),
            active_loans: acc.loans,
            total_officers: acc.officers.len() as u32,
        })
        .collect();

    PortfolioSummary {
        branches,
        portfolio_total: totals.portfolio_total,
        overdue_15d: totals.overdue_15d,
        par15_ratio: totals.par15_ratio(),
        active_loans: totals.loans,
        total_officers: totals.officers.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::decimal::Rate;
    use crate::ledger::{Repayment, RepaymentLedger};
    use crate::loan::LoanTerms;
    use crate::metrics::calculator::calculate_officer_metrics;
    use crate::state::compute_state;
    use crate::types::Dimensions;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn officer(name: &str) -> Officer {
        Officer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            region: "South West".to_string(),
            branch: "Ikeja".to_string(),
            channel: None,
            user_type: Some("AGENT".to_string()),
            vertical_lead: None,
        }
    }

    fn scorecard(name: &str, ayr: Decimal, risk_score: i32, dqi: i32) -> OfficerScorecard {
        let off = officer(name);
        let config = EngineConfig::standard();
        let mut aggregates = crate::aggregates::aggregate_officer(
            &off,
            &[],
            None,
            &config,
            date(2025, 7, 15),
        );
        aggregates.total_portfolio = Money::from_major(100_000);
        aggregates.disbursed_count = 5;
        let mut metrics = calculate_officer_metrics(&aggregates, &config);
        metrics.ayr = ayr;
        metrics.risk_score = risk_score;
        metrics.risk_band = crate::metrics::bands::RiskBand::for_score(risk_score, &config.bands);
        metrics.dqi = dqi;
        OfficerScorecard {
            officer: off,
            aggregates,
            metrics,
        }
    }

    #[test]
    fn test_rollup_of_empty_pass_is_all_zero() {
        let rolled = rollup_portfolio(&[], &EngineConfig::standard());
        assert_eq!(rolled, PortfolioMetrics::default());
        assert!(rolled.top_officer.is_none());
    }

    #[test]
    fn test_rollup_averages_and_watchlist() {
        let cards = vec![
            scorecard("Ngozi", dec!(0.60), 85, 90),
            scorecard("Tunde", dec!(0.20), 35, 41),
            scorecard("Amina", dec!(0.40), 62, 70),
        ];
        let rolled = rollup_portfolio(&cards, &EngineConfig::standard());

        assert_eq!(rolled.total_officers, 3);
        assert_eq!(rolled.total_loans, 15);
        assert_eq!(rolled.total_portfolio, Money::from_major(300_000));
        // integer division over the officer count
        assert_eq!(rolled.avg_dqi, 67);
        assert_eq!(rolled.avg_risk_score, 60);
        assert_eq!(rolled.avg_ayr, dec!(0.40));
        // only the red-band officer is watchlisted
        assert_eq!(rolled.watchlist_count, 1);
        assert_eq!(rolled.watchlist_portfolio, Money::from_major(100_000));

        let top = rolled.top_officer.unwrap();
        assert_eq!(top.name, "Ngozi");
        assert_eq!(top.ayr, dec!(0.60));
    }

    #[test]
    fn test_rollup_top_officer_requires_positive_yield() {
        let cards = vec![
            scorecard("Ngozi", Decimal::ZERO, 45, 45),
            scorecard("Tunde", Decimal::ZERO, 45, 45),
        ];
        let rolled = rollup_portfolio(&cards, &EngineConfig::standard());
        assert!(rolled.top_officer.is_none());
    }

    #[test]
    fn test_rollup_at_risk_officers() {
        let config = EngineConfig::standard();
        let mut quiet = scorecard("Ngozi", dec!(0.10), 50, 50);
        quiet.aggregates.avg_days_since_last_repayment = dec!(12);
        quiet.aggregates.avg_loan_age_days = dec!(20);
        let mut young = scorecard("Tunde", dec!(0.10), 50, 50);
        // a young book is not at risk even with quiet repayments
        young.aggregates.avg_days_since_last_repayment = dec!(12);
        young.aggregates.avg_loan_age_days = dec!(10);

        let rolled = rollup_portfolio(&[quiet, young], &config);
        assert_eq!(rolled.at_risk_officers_count, 1);
        assert_eq!(rolled.at_risk_officers_percentage, dec!(50));
    }

    #[test]
    fn test_rollup_delay_rate_skips_unrated_officers() {
        let mut rated = scorecard("Ngozi", dec!(0.10), 50, 50);
        rated.metrics.repayment_delay_rate = dec!(40);
        let unrated = scorecard("Tunde", dec!(0.10), 50, 50);

        let rolled = rollup_portfolio(&[rated, unrated], &EngineConfig::standard());
        assert_eq!(rolled.avg_repayment_delay_rate, dec!(40));
    }

    fn summary_record(
        officer_id: OfficerId,
        branch: &str,
        region: &str,
        principal: i64,
        due: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> LoanRecord {
        let terms = LoanTerms::new(
            Money::from_major(principal),
            Rate::from_percentage(10),
            Money::ZERO,
            date(2025, 6, 1),
            due,
        )
        .unwrap();
        let dimensions = Dimensions {
            region: region.to_string(),
            branch: branch.to_string(),
            channel: Some("field".to_string()),
            wave: None,
            user_type: Some("AGENT".to_string()),
        };
        let loan = Loan::new(Uuid::new_v4(), officer_id, terms, dimensions);
        let ledger = RepaymentLedger::new();
        let state = compute_state(&loan, &ledger, 0, &EngineConfig::standard(), now);
        LoanRecord {
            loan,
            ledger,
            state,
        }
    }

    #[test]
    fn test_summary_groups_and_ratios() {
        let as_of = date(2025, 7, 15);
        let officer_a = Uuid::new_v4();
        let officer_b = Uuid::new_v4();
        let records = vec![
            // 44 days past due at as_of, whole balance overdue
            summary_record(
                officer_a,
                "Ikeja",
                "South West",
                40_000,
                Some(date(2025, 6, 1)),
                as_of,
            ),
            // never due, clean
            summary_record(officer_a, "Ikeja", "South West", 60_000, None, as_of),
            summary_record(officer_b, "Kubwa", "North Central", 30_000, None, as_of),
        ];

        let summary = summarize_portfolio(
            &records,
            &SummaryFilters::default(),
            SummaryBasis::Outstanding,
            as_of,
        );

        assert_eq!(summary.active_loans, 3);
        assert_eq!(summary.total_officers, 2);
        assert_eq!(summary.portfolio_total, Money::from_major(130_000));
        // the overdue loan carries interest on top of principal
        assert_eq!(summary.overdue_15d, Money::from_major(44_000));
        assert_eq!(summary.branches.len(), 2);

        // rows come back in branch order
        assert_eq!(summary.branches[0].branch, "Ikeja");
        assert_eq!(summary.branches[0].portfolio_total, Money::from_major(100_000));
        assert_eq!(summary.branches[0].overdue_15d, Money::from_major(44_000));
        assert_eq!(summary.branches[0].par15_ratio, dec!(0.44));
        assert_eq!(summary.branches[0].total_officers, 1);
        assert_eq!(summary.branches[1].branch, "Kubwa");
        assert_eq!(summary.branches[1].overdue_15d, Money::ZERO);
        assert_eq!(summary.branches[1].par15_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_summary_filters_are_anded() {
        let as_of = date(2025, 7, 15);
        let officer_id = Uuid::new_v4();
        let records = vec![
            summary_record(officer_id, "Ikeja", "South West", 40_000, None, as_of),
            summary_record(officer_id, "Kubwa", "North Central", 30_000, None, as_of),
        ];

        let filters = SummaryFilters {
            branch: Some("Ikeja".to_string()),
            region: Some("South West".to_string()),
            ..SummaryFilters::default()
        };
        let summary = summarize_portfolio(&records, &filters, SummaryBasis::Outstanding, as_of);
        assert_eq!(summary.active_loans, 1);
        assert_eq!(summary.portfolio_total, Money::from_major(40_000));

        let mismatched = SummaryFilters {
            branch: Some("Ikeja".to_string()),
            region: Some("North Central".to_string()),
            ..SummaryFilters::default()
        };
        let empty = summarize_portfolio(&records, &mismatched, SummaryBasis::Outstanding, as_of);
        assert_eq!(empty, PortfolioSummary::default());
        assert!(empty.branches.is_empty());
    }

    #[test]
    fn test_summary_on_disbursed_basis() {
        let as_of = date(2025, 7, 15);
        let officer_id = Uuid::new_v4();
        let mut record = summary_record(officer_id, "Ikeja", "South West", 40_000, None, as_of);
        // partial repayment shrinks outstanding but not the disbursed basis
        let repayment = Repayment::new(
            Uuid::new_v4(),
            record.loan.id,
            Money::from_major(11_000),
            date(2025, 7, 1),
            as_of,
        )
        .unwrap();
        record.ledger.append(repayment).unwrap();
        record.state = compute_state(
            &record.loan,
            &record.ledger,
            0,
            &EngineConfig::standard(),
            as_of,
        );
        let records = vec![record];

        let outstanding = summarize_portfolio(
            &records,
            &SummaryFilters::default(),
            SummaryBasis::Outstanding,
            as_of,
        );
        let disbursed = summarize_portfolio(
            &records,
            &SummaryFilters::default(),
            SummaryBasis::Disbursed,
            as_of,
        );

        assert_eq!(disbursed.portfolio_total, Money::from_major(40_000));
        assert_eq!(outstanding.portfolio_total, Money::from_major(30_000));
    }
}
