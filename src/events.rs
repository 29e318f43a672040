use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, LoanStatus, OfficerId, RepaymentId};

/// all events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // loan lifecycle events
    LoanCreated {
        loan_id: LoanId,
        officer_id: OfficerId,
        principal: Money,
        interest_rate: Rate,
        fee_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanTermsUpdated {
        loan_id: LoanId,
        principal: Money,
        interest_rate: Rate,
        fee_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanStatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },

    // ledger events
    RepaymentRecorded {
        repayment_id: RepaymentId,
        loan_id: LoanId,
        amount: Money,
        payment_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    RepaymentReversed {
        repayment_id: RepaymentId,
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // state engine events
    StateRecomputed {
        loan_id: LoanId,
        principal_outstanding: Money,
        interest_outstanding: Money,
        fees_outstanding: Money,
        actual_outstanding: Money,
        current_dpd: i64,
        timestamp: DateTime<Utc>,
    },

    // metric pass events
    MetricsPassStarted {
        officers_in_scope: usize,
        timestamp: DateTime<Utc>,
    },
    MetricsPublished {
        officers: usize,
        total_portfolio: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
