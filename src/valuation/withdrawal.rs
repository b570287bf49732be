use crate::core::loan::Loan;
use crate::core::word::{Address, Word};
use crate::error::{EngineError, Result};
use crate::remote::CallArg;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const WITHDRAWAL_LIST: &str = "withdrawalList(uint256[],address)";

/// Lender funds that can be withdrawn in one batched call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingWithdrawal {
    /// Exact sum of the contributing lender balances.
    pub total: Decimal,
    /// Contributing loans, in input order.
    pub loan_ids: Vec<u64>,
}

impl PendingWithdrawal {
    pub fn is_empty(&self) -> bool {
        self.loan_ids.is_empty()
    }

    /// Arguments of `withdrawalList(loan_ids, to)`.
    pub fn to_call_args(&self, to: Address) -> Vec<CallArg> {
        withdrawal_call_args(&self.loan_ids, to)
    }
}

impl fmt::Display for PendingWithdrawal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pending Withdrawal ===")?;
        writeln!(f, "Total:  {}", self.total)?;
        writeln!(f, "Loans:  {}", self.loan_ids.len())?;
        for id in &self.loan_ids {
            writeln!(f, "  #{}", id)?;
        }
        Ok(())
    }
}

/// Sum withdrawable lender balances in one pass over `loans`.
///
/// A loan contributes iff its lender balance is positive. A total beyond
/// the decimal range is [`EngineError::AmountOverflow`].
pub fn compute_pending_withdrawal(loans: &[Loan]) -> Result<PendingWithdrawal> {
    loans
        .iter()
        .filter(|loan| loan.has_lender_balance())
        .try_fold(PendingWithdrawal::default(), |mut pending, loan| {
            pending.total = pending
                .total
                .checked_add(loan.lender_balance)
                .ok_or_else(|| EngineError::overflow("summing lender balances"))?;
            pending.loan_ids.push(loan.id);
            Ok(pending)
        })
}

pub(crate) fn withdrawal_call_args(loan_ids: &[u64], to: Address) -> Vec<CallArg> {
    vec![
        CallArg::UintList(loan_ids.iter().map(|id| Word::from_u64(*id)).collect()),
        CallArg::Address(to),
    ]
}
