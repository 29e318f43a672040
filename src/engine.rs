use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregates::aggregate_officer;
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{Repayment, RepaymentLedger};
use crate::loan::{Loan, LoanTerms};
use crate::metrics::calculator::calculate_officer_metrics;
use crate::metrics::portfolio::{
    rollup_portfolio, summarize_portfolio, OfficerScorecard, PortfolioMetrics, PortfolioSummary,
    SummaryFilters,
};
use crate::state::{compute_state, LoanState};
use crate::store::{LoanRecord, StateStore};
use crate::types::{LoanId, LoanStatus, Officer, OfficerId, RepaymentId};

/// one published metrics pass over the whole book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub as_of: DateTime<Utc>,
    pub scorecards: Vec<OfficerScorecard>,
    pub portfolio: PortfolioMetrics,
}

/// portfolio engine over a state store
///
/// every repayment mutation recomputes the loan's derived state inside the
/// same per-loan critical section, and metric passes publish their whole
/// result set in one swap so readers never see a half-updated pass
pub struct PortfolioEngine<S: StateStore> {
    store: S,
    config: EngineConfig,
    events: Mutex<EventStore>,
    published: RwLock<Option<MetricsSnapshot>>,
}

impl<S: StateStore> PortfolioEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            events: Mutex::new(EventStore::new()),
            published: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn register_officer(&self, officer: Officer) {
        self.store.upsert_officer(officer);
    }

    pub fn officer(&self, id: OfficerId) -> Result<Officer> {
        self.store
            .officer(id)
            .ok_or(EngineError::OfficerNotFound { id })
    }

    /// book a loan and compute its opening state
    pub fn create_loan(&self, loan: Loan, time_provider: &SafeTimeProvider) -> Result<LoanState> {
        if self.store.officer(loan.officer_id).is_none() {
            return Err(EngineError::OfficerNotFound {
                id: loan.officer_id,
            });
        }

        let now = time_provider.now();
        let event = Event::LoanCreated {
            loan_id: loan.id,
            officer_id: loan.officer_id,
            principal: loan.terms.principal,
            interest_rate: loan.terms.interest_rate,
            fee_amount: loan.terms.fee_amount,
            timestamp: now,
        };

        let ledger = RepaymentLedger::new();
        let state = compute_state(&loan, &ledger, 0, &self.config, now);
        self.store.insert_loan(LoanRecord {
            loan,
            ledger,
            state: state.clone(),
        })?;
        self.emit(event);
        Ok(state)
    }

    pub fn loan(&self, id: LoanId) -> Result<LoanRecord> {
        self.store.loan(id)
    }

    pub fn loan_state(&self, id: LoanId) -> Result<LoanState> {
        Ok(self.store.loan(id)?.state)
    }

    /// append a repayment and recompute the loan under its write lock
    pub fn record_repayment(
        &self,
        loan_id: LoanId,
        repayment_id: RepaymentId,
        amount: Money,
        payment_date: DateTime<Utc>,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let state = self.store.update_loan(loan_id, |record| {
            let repayment = Repayment::new(repayment_id, loan_id, amount, payment_date, now)?;
            record.ledger.append(repayment)?;
            Ok(recompute_record(record, &self.config, now))
        })?;

        debug!(%loan_id, %repayment_id, %amount, "repayment recorded");
        self.emit(Event::RepaymentRecorded {
            repayment_id,
            loan_id,
            amount,
            payment_date,
            timestamp: now,
        });
        self.emit_recomputed(loan_id, &state, now);
        Ok(state)
    }

    /// flag a repayment reversed and recompute as if it was never booked
    pub fn reverse_repayment(
        &self,
        loan_id: LoanId,
        repayment_id: RepaymentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let (amount, state) = self.store.update_loan(loan_id, |record| {
            let amount = record.ledger.reverse(repayment_id)?.amount;
            Ok((amount, recompute_record(record, &self.config, now)))
        })?;

        debug!(%loan_id, %repayment_id, %amount, "repayment reversed");
        self.emit(Event::RepaymentReversed {
            repayment_id,
            loan_id,
            amount,
            timestamp: now,
        });
        self.emit_recomputed(loan_id, &state, now);
        Ok(state)
    }

    /// re-derive a loan's state from its ledger, idempotent for an unchanged
    /// ledger
    pub fn recompute_loan_state(
        &self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let state = self
            .store
            .update_loan(loan_id, |record| Ok(recompute_record(record, &self.config, now)))?;
        self.emit_recomputed(loan_id, &state, now);
        Ok(state)
    }

    /// non-blocking recompute, fails with `LoanBusy` when another writer
    /// holds the loan so the caller can retry
    pub fn try_recompute_loan_state(
        &self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let state = self
            .store
            .try_update_loan(loan_id, |record| Ok(recompute_record(record, &self.config, now)))?;
        self.emit_recomputed(loan_id, &state, now);
        Ok(state)
    }

    /// replace loan terms and recompute, the allocation denominators change
    pub fn update_loan_terms(
        &self,
        loan_id: LoanId,
        terms: LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let event = Event::LoanTermsUpdated {
            loan_id,
            principal: terms.principal,
            interest_rate: terms.interest_rate,
            fee_amount: terms.fee_amount,
            timestamp: now,
        };
        let state = self.store.update_loan(loan_id, |record| {
            record.loan.terms = terms;
            Ok(recompute_record(record, &self.config, now))
        })?;
        self.emit(event);
        self.emit_recomputed(loan_id, &state, now);
        Ok(state)
    }

    pub fn set_loan_status(
        &self,
        loan_id: LoanId,
        status: LoanStatus,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanState> {
        let now = time_provider.now();
        let (old_status, state) = self.store.update_loan(loan_id, |record| {
            let old_status = record.loan.status;
            record.loan.status = status;
            Ok((old_status, record.state.clone()))
        })?;
        self.emit(Event::LoanStatusChanged {
            loan_id,
            old_status,
            new_status: status,
            timestamp: now,
        });
        Ok(state)
    }

    /// aggregate and score one officer's book as of a given day
    pub fn compute_officer_metrics(
        &self,
        officer_id: OfficerId,
        as_of: DateTime<Utc>,
    ) -> Result<OfficerScorecard> {
        let officer = self.officer(officer_id)?;
        Ok(self.scorecard_for(&officer, as_of))
    }

    /// score every in-scope officer in parallel, roll up the portfolio and
    /// publish the whole pass at once
    pub fn run_metrics_pass(&self, time_provider: &SafeTimeProvider) -> MetricsSnapshot {
        let as_of = time_provider.now();
        let mut officers: Vec<Officer> = self
            .store
            .officers()
            .into_iter()
            .filter(|o| o.in_scope())
            .collect();
        officers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        self.emit(Event::MetricsPassStarted {
            officers_in_scope: officers.len(),
            timestamp: as_of,
        });
        info!(officers = officers.len(), "metrics pass started");

        let scorecards: Vec<OfficerScorecard> = officers
            .par_iter()
            .map(|officer| self.scorecard_for(officer, as_of))
            .collect();
        let portfolio = rollup_portfolio(&scorecards, &self.config);

        let snapshot = MetricsSnapshot {
            as_of,
            scorecards,
            portfolio,
        };
        {
            let mut published = write_lock(&self.published);
            *published = Some(snapshot.clone());
        }

        info!(
            officers = snapshot.scorecards.len(),
            total_portfolio = %snapshot.portfolio.total_portfolio,
            "metrics pass published"
        );
        self.emit(Event::MetricsPublished {
            officers: snapshot.scorecards.len(),
            total_portfolio: snapshot.portfolio.total_portfolio,
            timestamp: as_of,
        });
        snapshot
    }

    /// last fully published pass, if any
    pub fn published_metrics(&self) -> Option<MetricsSnapshot> {
        read_lock(&self.published).clone()
    }

    /// filtered branch-level summary of the current book
    pub fn portfolio_summary(
        &self,
        filters: &SummaryFilters,
        time_provider: &SafeTimeProvider,
    ) -> PortfolioSummary {
        let as_of = time_provider.now();
        let records = self.store.loans();
        summarize_portfolio(&records, filters, self.config.summary_basis, as_of)
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take_events()
    }

    fn scorecard_for(&self, officer: &Officer, as_of: DateTime<Utc>) -> OfficerScorecard {
        let records = self.store.loans_for_officer(officer.id);
        let prior = self.prior_bucket(officer.id);
        let aggregates = aggregate_officer(officer, &records, prior, &self.config, as_of);
        let metrics = calculate_officer_metrics(&aggregates, &self.config);
        OfficerScorecard {
            officer: officer.clone(),
            aggregates,
            metrics,
        }
    }

    /// early-delinquency balance from the last published pass, feeds the
    /// roll rate denominator on the next one
    fn prior_bucket(&self, officer_id: OfficerId) -> Option<Money> {
        read_lock(&self.published).as_ref().and_then(|snapshot| {
            snapshot
                .scorecards
                .iter()
                .find(|card| card.officer.id == officer_id)
                .map(|card| card.aggregates.dpd_1_6_balance)
        })
    }

    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .emit(event);
    }

    fn emit_recomputed(&self, loan_id: LoanId, state: &LoanState, now: DateTime<Utc>) {
        self.emit(Event::StateRecomputed {
            loan_id,
            principal_outstanding: state.principal_outstanding,
            interest_outstanding: state.interest_outstanding,
            fees_outstanding: state.fees_outstanding,
            actual_outstanding: state.actual_outstanding,
            current_dpd: state.current_dpd,
            timestamp: now,
        });
    }
}

fn recompute_record(record: &mut LoanRecord, config: &EngineConfig, now: DateTime<Utc>) -> LoanState {
    let prior_max = record.state.max_dpd_ever;
    record.state = compute_state(&record.loan, &record.ledger, prior_max, config, now);
    record.state.clone()
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
