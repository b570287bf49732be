//! Contracts of the external collaborators the engine awaits.
//!
//! Every method is a single await point with one success and one failure
//! outcome. Retries, timeouts and cancellation belong to the implementor;
//! cancellation must surface as [`TransportError::Cancelled`].

pub mod mock;

use crate::core::loan::{CosignerOffer, Loan};
use crate::core::word::{Address, Word};
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One positional argument of a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallArg {
    Address(Address),
    Uint(Word),
    Word(Word),
    Bytes(Vec<u8>),
    AddressList(Vec<Address>),
    WordList(Vec<Word>),
    UintList(Vec<Word>),
}

impl CallArg {
    pub fn uint(value: u64) -> Self {
        CallArg::Uint(Word::from_u64(value))
    }
}

/// Opaque handle of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHandle(String);

impl TxHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger backend capable of read-only calls and state-changing submissions.
///
/// Implementations must forward `args` in exactly the given order.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read-only call returning the result as ledger words.
    async fn call(
        &self,
        contract: Address,
        signature: &str,
        args: &[CallArg],
    ) -> Result<Vec<Word>, TransportError>;

    /// Submit a transaction from `sender`.
    async fn submit(
        &self,
        contract: Address,
        signature: &str,
        args: &[CallArg],
        sender: Address,
    ) -> Result<TxHandle, TransportError>;
}

/// Payload handed to an oracle's rate function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OracleData(Vec<u8>);

impl OracleData {
    /// The "no extra data required" payload.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for OracleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Raw `(rate, decimals)` pair returned by an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuote {
    pub rate: Word,
    pub decimals: Word,
}

/// Rate oracle contracts, addressed per call.
#[async_trait]
pub trait RateOracle: Send + Sync {
    /// URL of the oracle's currency→data lookup table; empty if none.
    async fn url(&self, oracle: Address) -> Result<String, TransportError>;

    async fn get_rate(
        &self,
        oracle: Address,
        currency: Word,
        data: &OracleData,
    ) -> Result<RateQuote, TransportError>;
}

/// One entry of an oracle lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleDataEntry {
    pub currency: String,
    /// Hex-encoded payload, `0x`-prefixed.
    pub data: String,
}

/// HTTP access to oracle lookup tables.
#[async_trait]
pub trait OracleHttp: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<OracleDataEntry>, TransportError>;
}

/// Cosigner negotiation, reduced to its offer.
#[async_trait]
pub trait CosignerService: Send + Sync {
    /// Offer for `loan`, or `None` when no cosigner backs it.
    async fn offer(&self, loan: &Loan) -> Result<Option<CosignerOffer>, TransportError>;
}

/// Source of the sender identity.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn account(&self) -> Result<Address, TransportError>;
}
