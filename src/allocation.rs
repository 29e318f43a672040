use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::loan::LoanTerms;

/// one repayment split across the three outstanding components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RepaymentAllocation {
    pub to_principal: Money,
    pub to_interest: Money,
    pub to_fees: Money,
}

impl RepaymentAllocation {
    pub fn total(&self) -> Money {
        self.to_principal + self.to_interest + self.to_fees
    }
}

impl std::ops::Add for RepaymentAllocation {
    type Output = RepaymentAllocation;

    fn add(self, other: RepaymentAllocation) -> RepaymentAllocation {
        RepaymentAllocation {
            to_principal: self.to_principal + other.to_principal,
            to_interest: self.to_interest + other.to_interest,
            to_fees: self.to_fees + other.to_fees,
        }
    }
}

impl std::ops::AddAssign for RepaymentAllocation {
    fn add_assign(&mut self, other: RepaymentAllocation) {
        self.to_principal += other.to_principal;
        self.to_interest += other.to_interest;
        self.to_fees += other.to_fees;
    }
}

/// split a repayment across principal, interest and fees in proportion to
/// each component's share of the total amount expected
///
/// interest and fees take `amount * component_expected / total_expected`,
/// principal takes the remainder so the three parts always sum back to the
/// repayment amount. a non-positive total_expected zeroes the interest and
/// fees shares and routes the whole amount to principal.
pub fn allocate(terms: &LoanTerms, amount: Money) -> RepaymentAllocation {
    let total_expected = terms.total_expected();
    if !total_expected.is_positive() {
        return RepaymentAllocation {
            to_principal: amount,
            to_interest: Money::ZERO,
            to_fees: Money::ZERO,
        };
    }

    let denom = total_expected.as_decimal();
    let to_interest = amount * terms.interest_expected().as_decimal() / denom;
    let to_fees = amount * terms.fee_amount.as_decimal() / denom;
    let to_principal = amount - to_interest - to_fees;

    RepaymentAllocation {
        to_principal,
        to_interest,
        to_fees,
    }
}
