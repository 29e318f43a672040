use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregates::OfficerAggregates;
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::metrics::bands::{AyrBand, RiskBand};
use crate::types::OfficerId;

/// named ratio metrics and composite scores for one officer
///
/// every ratio is total: a zero or non-positive denominator yields 0, never
/// an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerMetrics {
    pub officer_id: OfficerId,
    pub as_of: DateTime<Utc>,

    /// first-installment miss rate
    pub fimr: Decimal,
    /// share of the book sitting one to six days late
    pub slippage: Decimal,
    /// late balance that rolled deeper relative to the prior early bucket
    pub roll_rate: Decimal,
    /// fee recovery rate
    pub frr: Decimal,
    /// adjusted yield ratio over mid-month exposure
    pub ayr: Decimal,
    pub ayr_band: AyrBand,
    /// interest plus fees actually collected
    pub yield_collected: Money,
    /// portfolio overdue ratio, fifteen-day principal over the whole book
    pub porr: Decimal,
    /// single-channel book for now, carried at 1.0
    pub channel_purity: Decimal,
    pub on_time_rate: Decimal,
    /// repayment cadence relative to the expected quarter-of-age pace
    pub repayment_delay_rate: Decimal,

    pub risk_score_norm: Decimal,
    pub risk_score: i32,
    pub risk_band: RiskBand,
    pub dqi: i32,
}

/// derive the officer metric set from raw aggregates
pub fn calculate_officer_metrics(
    agg: &OfficerAggregates,
    config: &EngineConfig,
) -> OfficerMetrics {
    let w = &config.scoring;

    let fimr = guarded_ratio(
        Decimal::from(agg.first_miss_count),
        Decimal::from(agg.disbursed_count),
    );
    let slippage = agg.dpd_1_6_balance.ratio_of(agg.amount_due_7d);
    let roll_rate = agg.moved_7_30_balance.ratio_of(agg.prev_dpd_1_6_balance);
    let frr = agg.fees_collected.ratio_of(agg.fees_due);
    let yield_collected = agg.interest_collected + agg.fees_collected;
    let ayr = yield_collected.ratio_of(agg.par15_mid_month);
    let porr = agg.overdue_15d_balance.ratio_of(agg.total_portfolio);
    let on_time_rate = (Decimal::ONE - slippage).max(Decimal::ZERO);

    let repayment_delay_rate = if agg.avg_loan_age_days > Decimal::ZERO {
        let pace = agg.avg_days_since_last_repayment / agg.avg_loan_age_days;
        (Decimal::ONE - pace / w.delay_normalization) * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    // each penalty term is clamped to its own weight so no single factor can
    // push the score outside the scale
    let delay_penalty = ((Decimal::ONE - repayment_delay_rate / Decimal::ONE_HUNDRED) * w.delay)
        .clamp(Decimal::ZERO, w.delay);
    let ayr_penalty = w.ayr * (Decimal::ONE - ayr.min(Decimal::ONE));

    let risk_score_norm = (Decimal::ONE
        - w.porr * porr
        - w.fimr * fimr
        - w.roll * roll_rate
        - delay_penalty
        - ayr_penalty)
        .clamp(Decimal::ZERO, Decimal::ONE);
    let risk_score = score_points(risk_score_norm);

    let dqi_fraction = w.dqi_risk * risk_score_norm
        + w.dqi_on_time * on_time_rate
        + w.dqi_fimr * (Decimal::ONE - fimr);
    let dqi = score_points(dqi_fraction).clamp(0, 100);

    OfficerMetrics {
        officer_id: agg.officer_id,
        as_of: agg.as_of,
        fimr,
        slippage,
        roll_rate,
        frr,
        ayr,
        ayr_band: AyrBand::for_ratio(ayr, &config.bands),
        yield_collected,
        porr,
        channel_purity: Decimal::ONE,
        on_time_rate,
        repayment_delay_rate,
        risk_score_norm,
        risk_score,
        risk_band: RiskBand::for_score(risk_score, &config.bands),
        dqi,
    }
}

fn guarded_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

/// truncate a 0-1 fraction onto the hundred-point scale
fn score_points(fraction: Decimal) -> i32 {
    (fraction * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i32()
        .unwrap_or(0)
}
