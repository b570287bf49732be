use crate::core::word::{Address, Word};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Divisor that turns an on-ledger interest rate into an annual percentage.
///
/// Rates are stored as the number of seconds-per-unit over which one
/// percent accrues, so the annual percentage is this constant over the rate.
pub const ANNUAL_INTEREST_DIVISOR: Decimal = dec!(311040000000000);

/// Lifecycle status as stored on the ledger.
///
/// Unknown values are preserved rather than rejected at decode time;
/// curation decides what to do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Request,
    Ongoing,
    Paid,
    Destroyed,
    Unknown(u64),
}

impl LoanStatus {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => LoanStatus::Request,
            1 => LoanStatus::Ongoing,
            2 => LoanStatus::Paid,
            3 => LoanStatus::Destroyed,
            other => LoanStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> u64 {
        match self {
            LoanStatus::Request => 0,
            LoanStatus::Ongoing => 1,
            LoanStatus::Paid => 2,
            LoanStatus::Destroyed => 3,
            LoanStatus::Unknown(other) => *other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, LoanStatus::Unknown(_))
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Request => write!(f, "request"),
            LoanStatus::Ongoing => write!(f, "ongoing"),
            LoanStatus::Paid => write!(f, "paid"),
            LoanStatus::Destroyed => write!(f, "destroyed"),
            LoanStatus::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// One ledger-resident loan contract.
///
/// A `Loan` is a decoded snapshot of a 20-word record. It is never mutated
/// by the client: balances change only through ledger state transitions,
/// which show up as a new snapshot on the next query.
///
/// `(id, engine)` identifies a loan across the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Identifier assigned by the engine at creation.
    pub id: u64,
    /// Loan engine contract owning this record.
    pub engine: Address,
    pub status: LoanStatus,
    /// Rate oracle, or the zero address for settlement-token loans.
    pub oracle: Address,
    pub borrower: Address,
    pub lender: Address,
    pub creator: Address,
    pub cosigner: Address,
    /// Principal in the loan's own currency, integer base units.
    pub raw_amount: Decimal,
    pub interest: Decimal,
    pub punitory_interest: Decimal,
    pub interest_timestamp: u64,
    pub paid: Decimal,
    pub interest_rate: u64,
    pub interest_rate_punitory: u64,
    pub due_time: u64,
    pub dues_in: u64,
    /// Currency as the ledger sees it.
    pub currency: Word,
    /// Currency as oracle lookup tables see it (e.g. `"ARS"`).
    pub currency_raw: String,
    pub cancelable_at: u64,
    /// Owed to the lender and not yet withdrawn.
    pub lender_balance: Decimal,
    pub expiration_requests: u64,
}

impl Loan {
    /// Whether the principal is already denominated in the settlement token.
    pub fn has_oracle(&self) -> bool {
        !self.oracle.is_zero()
    }

    /// Annual interest in percent, or `None` when the rate is zero.
    pub fn annual_interest(&self) -> Option<Decimal> {
        annual_percentage(self.interest_rate)
    }

    /// Annual punitory interest in percent; a zero rate means no punitory
    /// interest.
    pub fn annual_punitory_interest(&self) -> Decimal {
        annual_percentage(self.interest_rate_punitory).unwrap_or(Decimal::ZERO)
    }

    /// Deadline for a lender to fund a loan request.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.expiration_requests)
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.due_time)
    }

    /// Whether the lender has funds waiting to be withdrawn.
    pub fn has_lender_balance(&self) -> bool {
        self.lender_balance > Decimal::ZERO
    }
}

fn annual_percentage(rate: u64) -> Option<Decimal> {
    if rate == 0 {
        return None;
    }
    ANNUAL_INTEREST_DIVISOR.checked_div(Decimal::from(rate))
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)
}

/// A cosigner's offer to back a loan, consumed opaquely by `lend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosignerOffer {
    pub contract: Address,
    pub lend_data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loan() -> Loan {
        Loan {
            id: 7,
            engine: Address::ZERO,
            status: LoanStatus::Request,
            oracle: Address::ZERO,
            borrower: Address::ZERO,
            lender: Address::ZERO,
            creator: Address::ZERO,
            cosigner: Address::ZERO,
            raw_amount: dec!(1000),
            interest: Decimal::ZERO,
            punitory_interest: Decimal::ZERO,
            interest_timestamp: 0,
            paid: Decimal::ZERO,
            interest_rate: 10_368_000_000_000,
            interest_rate_punitory: 0,
            due_time: 0,
            dues_in: 86_400,
            currency: Word::ZERO,
            currency_raw: String::new(),
            cancelable_at: 0,
            lender_balance: Decimal::ZERO,
            expiration_requests: 1_700_000_000,
        }
    }

    #[test]
    fn test_status_codes() {
        for code in 0..4 {
            assert_eq!(LoanStatus::from_code(code).code(), code);
            assert!(LoanStatus::from_code(code).is_known());
        }
        assert_eq!(LoanStatus::from_code(9), LoanStatus::Unknown(9));
        assert!(!LoanStatus::Unknown(9).is_known());
    }

    #[test]
    fn test_annual_interest() {
        let loan = sample_loan();
        assert_eq!(loan.annual_interest(), Some(dec!(30)));
        assert_eq!(loan.annual_punitory_interest(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_has_no_annual_interest() {
        let mut loan = sample_loan();
        loan.interest_rate = 0;
        assert_eq!(loan.annual_interest(), None);
    }

    #[test]
    fn test_expiration_timestamp() {
        let loan = sample_loan();
        assert_eq!(loan.expires_at().map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(loan.due_at(), None);
    }

    #[test]
    fn test_oracle_sentinel() {
        let loan = sample_loan();
        assert!(!loan.has_oracle());
        assert!(!loan.has_lender_balance());
    }
}
