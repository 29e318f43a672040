use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a loan officer
pub type OfficerId = Uuid;

/// unique identifier for a repayment event
pub type RepaymentId = Uuid;

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// disbursed and repaying
    Active,
    /// fully settled
    Closed,
    /// written off as loss
    WrittenOff,
}

impl LoanStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Active)
    }
}

/// dimensional attributes carried on a loan, used only for filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    pub region: String,
    pub branch: String,
    pub channel: Option<String>,
    pub wave: Option<String>,
    pub user_type: Option<String>,
}

/// user types whose officers participate in metric reporting
pub const REPORTABLE_USER_TYPES: [&str; 9] = [
    "AGENT",
    "AJO_AGENT",
    "DMO_AGENT",
    "MERCHANT",
    "MERCHANT_AGENT",
    "MICRO_SAVER",
    "PERSONAL",
    "PROSPER_AGENT",
    "STAFF_AGENT",
];

/// whether an officer with the given user type is in reporting scope
///
/// absent user type stays in scope so terminated officers keep their history,
/// "lite" and any other unlisted type is excluded
pub fn user_type_in_scope(user_type: Option<&str>) -> bool {
    match user_type {
        None => true,
        Some(t) => REPORTABLE_USER_TYPES.contains(&t),
    }
}

/// a loan officer and the book attributes metrics group by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: OfficerId,
    pub name: String,
    pub email: Option<String>,
    pub region: String,
    pub branch: String,
    pub channel: Option<String>,
    pub user_type: Option<String>,
    pub vertical_lead: Option<String>,
}

impl Officer {
    pub fn in_scope(&self) -> bool {
        user_type_in_scope(self.user_type.as_deref())
    }
}
