pub mod aggregates;
pub mod allocation;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod metrics;
pub mod state;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use aggregates::{aggregate_officer, OfficerAggregates};
pub use allocation::{allocate, RepaymentAllocation};
pub use config::{
    ActivityThresholds, BandThresholds, EngineConfig, ScoringWeights, SummaryBasis,
};
pub use decimal::{Money, Rate};
pub use engine::{MetricsSnapshot, PortfolioEngine};
pub use errors::{EngineError, Result};
pub use events::{Event, EventStore};
pub use ledger::{Repayment, RepaymentLedger};
pub use loan::{Loan, LoanTerms};
pub use metrics::{
    calculate_officer_metrics, rollup_portfolio, summarize_portfolio, AyrBand, BranchSummary,
    DpdStatus, OfficerMetrics, OfficerScorecard, PortfolioMetrics, PortfolioSummary, RiskBand,
    RollDirection, SummaryFilters, TopOfficer,
};
pub use state::{compute_state, days_between, LoanState};
pub use store::{LoanRecord, MemoryStore, StateStore};
pub use types::{Dimensions, LoanId, LoanStatus, Officer, OfficerId, RepaymentId};
pub use views::{LoanView, ScorecardView, SnapshotView};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
