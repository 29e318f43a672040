use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BandThresholds;

/// composite risk score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Green,
    Watch,
    Amber,
    Red,
}

impl RiskBand {
    pub fn for_score(score: i32, bands: &BandThresholds) -> Self {
        if score >= bands.risk_green {
            RiskBand::Green
        } else if score >= bands.risk_watch {
            RiskBand::Watch
        } else if score >= bands.risk_amber {
            RiskBand::Amber
        } else {
            RiskBand::Red
        }
    }

    /// red-band officers are surfaced on the watchlist
    pub fn is_watchlisted(&self) -> bool {
        matches!(self, RiskBand::Red)
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskBand::Green => "Green",
            RiskBand::Watch => "Watch",
            RiskBand::Amber => "Amber",
            RiskBand::Red => "Red",
        };
        write!(f, "{}", label)
    }
}

/// yield ratio band shared by the collected-ratio metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AyrBand {
    Green,
    Watch,
    Flag,
}

impl AyrBand {
    pub fn for_ratio(ratio: Decimal, bands: &BandThresholds) -> Self {
        if ratio >= bands.ayr_green {
            AyrBand::Green
        } else if ratio >= bands.ayr_watch {
            AyrBand::Watch
        } else {
            AyrBand::Flag
        }
    }
}

impl fmt::Display for AyrBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AyrBand::Green => "Green",
            AyrBand::Watch => "Watch",
            AyrBand::Flag => "Flag",
        };
        write!(f, "{}", label)
    }
}

/// reporting label for a loan's days past due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DpdStatus {
    Current,
    Dpd1To3,
    Dpd4To6,
    RolledTo7To15,
    RolledTo16To30,
    Overdue,
}

impl DpdStatus {
    pub fn for_dpd(dpd: i64) -> Self {
        match dpd {
            i64::MIN..=0 => DpdStatus::Current,
            1..=3 => DpdStatus::Dpd1To3,
            4..=6 => DpdStatus::Dpd4To6,
            7..=15 => DpdStatus::RolledTo7To15,
            16..=30 => DpdStatus::RolledTo16To30,
            _ => DpdStatus::Overdue,
        }
    }
}

impl fmt::Display for DpdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DpdStatus::Current => "Current",
            DpdStatus::Dpd1To3 => "D1-3",
            DpdStatus::Dpd4To6 => "D4-6",
            DpdStatus::RolledTo7To15 => "Rolled to D7-15",
            DpdStatus::RolledTo16To30 => "Rolled to D16-30",
            DpdStatus::Overdue => "Overdue",
        };
        write!(f, "{}", label)
    }
}

/// movement of a loan's delinquency between two observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollDirection {
    Worsening,
    Improving,
    Stable,
}

impl RollDirection {
    pub fn between(current_dpd: i64, previous_dpd: i64) -> Self {
        if current_dpd > previous_dpd {
            RollDirection::Worsening
        } else if current_dpd < previous_dpd {
            RollDirection::Improving
        } else {
            RollDirection::Stable
        }
    }
}

impl fmt::Display for RollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RollDirection::Worsening => "Worsening",
            RollDirection::Improving => "Improving",
            RollDirection::Stable => "Stable",
        };
        write!(f, "{}", label)
    }
}
