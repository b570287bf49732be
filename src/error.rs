//! Error taxonomy for the query and valuation engine.

use crate::config::ConfigError;
use thiserror::Error;

/// Failure reported by an external collaborator (ledger, oracle, HTTP,
/// cosigner or account provider).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote call completed with an error.
    #[error("remote call failed: {reason}")]
    CallFailed { reason: String },

    /// The awaited call was cancelled before producing a result.
    #[error("remote call was cancelled")]
    Cancelled,

    /// Any other transport failure.
    #[error("remote transport error: {source}")]
    Other {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    pub fn call_failed(reason: impl Into<String>) -> Self {
        TransportError::CallFailed {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by every engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The binary shape of a loan record is wrong.
    #[error("malformed loan record: {reason}")]
    MalformedRecord { reason: String },

    /// A single-loan fetch returned an empty result.
    #[error("loan {id} does not exist")]
    LoanNotFound { id: u64 },

    /// The oracle lookup table has no entry for the loan's currency.
    #[error("oracle did not provide data for currency {currency:?}")]
    OracleDataMissing { currency: String },

    /// The oracle lookup table entry for the loan's currency is not hex.
    #[error("oracle data for currency {currency:?} is invalid: {reason}")]
    InvalidOracleData { currency: String, reason: String },

    /// The oracle or its lookup URL could not be reached.
    #[error("oracle unavailable: {source}")]
    OracleUnavailable {
        #[source]
        source: TransportError,
    },

    /// The oracle reported more decimals than the 18-decimal base supports.
    #[error("oracle precision of {decimals} decimals is not supported (max 18)")]
    UnsupportedOraclePrecision { decimals: u64 },

    /// An amount does not fit the fixed-point representation.
    #[error("amount overflow while {context}")]
    AmountOverflow { context: String },

    /// Ledger, account or cosigner call failure, propagated unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        EngineError::MalformedRecord {
            reason: reason.into(),
        }
    }

    pub fn overflow(context: impl Into<String>) -> Self {
        EngineError::AmountOverflow {
            context: context.into(),
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Only collaborator failures are transient; shape violations, missing
    /// data and precision errors describe on-ledger state and will repeat.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::OracleUnavailable { .. } | EngineError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
