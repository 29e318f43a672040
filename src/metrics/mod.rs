pub mod bands;
pub mod calculator;
pub mod portfolio;

pub use bands::{AyrBand, DpdStatus, RiskBand, RollDirection};
pub use calculator::{calculate_officer_metrics, OfficerMetrics};
pub use portfolio::{
    rollup_portfolio, summarize_portfolio, BranchSummary, OfficerScorecard, PortfolioMetrics,
    PortfolioSummary, SummaryFilters, TopOfficer,
};
