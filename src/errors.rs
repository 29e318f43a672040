use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, OfficerId, RepaymentId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid principal amount: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("invalid fee amount: {amount}")]
    InvalidFeeAmount {
        amount: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("officer not found: {id}")]
    OfficerNotFound {
        id: OfficerId,
    },

    #[error("repayment not found: {id}")]
    RepaymentNotFound {
        id: RepaymentId,
    },

    #[error("loan already exists: {id}")]
    DuplicateLoan {
        id: LoanId,
    },

    #[error("repayment already recorded: {id}")]
    DuplicateRepayment {
        id: RepaymentId,
    },

    #[error("repayment already reversed: {id}")]
    RepaymentAlreadyReversed {
        id: RepaymentId,
    },

    #[error("loan locked by another writer: {id}")]
    LoanBusy {
        id: LoanId,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
