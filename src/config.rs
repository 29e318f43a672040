use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub bands: BandThresholds,
    pub activity: ActivityThresholds,
    /// which balance feeds portfolio summary totals
    pub summary_basis: SummaryBasis,
}

/// balance basis for portfolio summary totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryBasis {
    /// principal still out on the book
    #[default]
    Outstanding,
    /// principal originally disbursed
    Disbursed,
}

/// weights for the composite risk score and dqi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// penalty weight for the portfolio overdue ratio (20 points)
    pub porr: Decimal,
    /// penalty weight for the first-installment miss rate (15 points)
    pub fimr: Decimal,
    /// penalty weight for the roll rate (10 points)
    pub roll: Decimal,
    /// penalty weight for the repayment delay rate (40 points)
    pub delay: Decimal,
    /// penalty weight for the adjusted yield ratio (15 points)
    pub ayr: Decimal,
    /// dqi contribution of the normalized risk score
    pub dqi_risk: Decimal,
    /// dqi contribution of the on-time rate
    pub dqi_on_time: Decimal,
    /// dqi contribution of the inverse miss rate
    pub dqi_fimr: Decimal,
    /// expected days-since-repayment to loan-age ratio for a healthy book
    pub delay_normalization: Decimal,
}

/// fixed classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandThresholds {
    /// risk score at or above which an officer is green
    pub risk_green: i32,
    /// risk score at or above which an officer is on watch
    pub risk_watch: i32,
    /// risk score at or above which an officer is amber, below is red
    /// and on the watchlist
    pub risk_amber: i32,
    /// ayr at or above which an officer is green
    pub ayr_green: Decimal,
    /// ayr at or above which an officer is on watch, below is flagged
    pub ayr_watch: Decimal,
}

/// cutoffs for repayment-activity aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityThresholds {
    /// loans with total outstanding above this count toward behavior averages
    pub active_outstanding_floor: Money,
    /// days since last repayment beyond which an officer book is at risk
    pub at_risk_days_since_repayment: Decimal,
    /// average loan age beyond which the at-risk cutoff applies
    pub at_risk_loan_age_days: Decimal,
}

impl EngineConfig {
    /// standard production configuration
    pub fn standard() -> Self {
        Self {
            scoring: ScoringWeights {
                porr: dec!(0.20),
                fimr: dec!(0.15),
                roll: dec!(0.10),
                delay: dec!(0.40),
                ayr: dec!(0.15),
                dqi_risk: dec!(0.50),
                dqi_on_time: dec!(0.35),
                dqi_fimr: dec!(0.15),
                delay_normalization: dec!(0.25),
            },
            bands: BandThresholds {
                risk_green: 80,
                risk_watch: 60,
                risk_amber: 40,
                ayr_green: dec!(0.50),
                ayr_watch: dec!(0.30),
            },
            activity: ActivityThresholds {
                active_outstanding_floor: Money::from_major(2_000),
                at_risk_days_since_repayment: dec!(10),
                at_risk_loan_age_days: dec!(14),
            },
            summary_basis: SummaryBasis::Outstanding,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_weights_sum_to_one() {
        let w = EngineConfig::standard().scoring;
        assert_eq!(w.porr + w.fimr + w.roll + w.delay + w.ayr, dec!(1.00));
        assert_eq!(w.dqi_risk + w.dqi_on_time + w.dqi_fimr, dec!(1.00));
    }
}
