use crate::config::CurationRules;
use crate::core::loan::Loan;
use log::{debug, warn};
use std::fmt;

/// Why a decoded loan was dropped by curation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownStatus(u64),
    InvalidCurrency,
    CurrencyWithoutOracle,
    ZeroInterestRate,
    InterestAboveCap,
    PunitoryInterestAboveCap,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownStatus(code) => write!(f, "unknown status {}", code),
            Rejection::InvalidCurrency => write!(f, "currency is not an ASCII code"),
            Rejection::CurrencyWithoutOracle => write!(f, "foreign currency without an oracle"),
            Rejection::ZeroInterestRate => write!(f, "zero interest rate"),
            Rejection::InterestAboveCap => write!(f, "annual interest above cap"),
            Rejection::PunitoryInterestAboveCap => write!(f, "punitory interest above cap"),
        }
    }
}

/// First rule `loan` violates, if any.
pub fn check_loan(loan: &Loan, rules: &CurationRules) -> Option<Rejection> {
    if !loan.status.is_known() {
        return Some(Rejection::UnknownStatus(loan.status.code()));
    }
    if loan.currency.to_ascii_code().is_none() {
        return Some(Rejection::InvalidCurrency);
    }
    if !loan.has_oracle() && !loan.currency.is_zero() {
        return Some(Rejection::CurrencyWithoutOracle);
    }
    match loan.annual_interest() {
        None => return Some(Rejection::ZeroInterestRate),
        Some(annual) if annual > rules.max_annual_interest => {
            return Some(Rejection::InterestAboveCap)
        }
        Some(_) => {}
    }
    if loan.annual_punitory_interest() > rules.max_annual_punitory_interest {
        return Some(Rejection::PunitoryInterestAboveCap);
    }
    None
}

/// Drop internally inconsistent loans, keeping survivors in input order.
pub fn curate_loans(loans: Vec<Loan>, rules: &CurationRules) -> Vec<Loan> {
    let total = loans.len();
    let curated: Vec<Loan> = loans
        .into_iter()
        .filter(|loan| match check_loan(loan, rules) {
            Some(reason) => {
                warn!("Dropping loan {} of engine {}: {}", loan.id, loan.engine, reason);
                false
            }
            None => true,
        })
        .collect();
    debug!("Curation kept {} of {} loans", curated.len(), total);
    curated
}
