//! In-memory collaborators for tests and demos.
//!
//! Each mock stores canned responses that can be changed programmatically
//! and records what the engine asked for, so argument order can be checked.

use crate::core::loan::{CosignerOffer, Loan};
use crate::core::word::{Address, Word};
use crate::error::TransportError;
use crate::remote::{
    AccountProvider, CallArg, CosignerService, LedgerClient, OracleData, OracleDataEntry,
    OracleHttp, RateOracle, RateQuote, TxHandle,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A call or submission as seen by [`MockLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub contract: Address,
    pub signature: String,
    pub args: Vec<CallArg>,
    pub sender: Option<Address>,
}

type CallKey = (Address, String);

/// Mock ledger answering read-only calls from canned word lists.
///
/// A response registered for specific arguments wins over one registered
/// for any arguments.
#[derive(Default)]
pub struct MockLedger {
    responses: RwLock<HashMap<CallKey, Vec<Word>>>,
    exact_responses: RwLock<HashMap<(CallKey, Vec<CallArg>), Vec<Word>>>,
    failing: RwLock<HashSet<CallKey>>,
    calls: RwLock<Vec<RecordedCall>>,
    submissions: RwLock<Vec<RecordedCall>>,
    next_tx: AtomicU64,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call of `signature` on `contract` with `words`.
    pub fn set_response(&self, contract: Address, signature: &str, words: Vec<Word>) {
        write(&self.responses).insert((contract, signature.to_string()), words);
    }

    /// Answer calls of `signature` on `contract` with exactly `args`.
    pub fn set_response_for(
        &self,
        contract: Address,
        signature: &str,
        args: Vec<CallArg>,
        words: Vec<Word>,
    ) {
        write(&self.exact_responses).insert(((contract, signature.to_string()), args), words);
    }

    /// Make calls and submissions of `signature` on `contract` fail.
    pub fn fail(&self, contract: Address, signature: &str) {
        write(&self.failing).insert((contract, signature.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        read(&self.calls).clone()
    }

    pub fn submissions(&self) -> Vec<RecordedCall> {
        read(&self.submissions).clone()
    }

    /// Number of read-only calls made for `signature`.
    pub fn call_count(&self, signature: &str) -> usize {
        read(&self.calls)
            .iter()
            .filter(|c| c.signature == signature)
            .count()
    }

    fn check_failing(&self, contract: Address, signature: &str) -> Result<(), TransportError> {
        if read(&self.failing).contains(&(contract, signature.to_string())) {
            return Err(TransportError::call_failed(format!(
                "{} on {} failed",
                signature, contract
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn call(
        &self,
        contract: Address,
        signature: &str,
        args: &[CallArg],
    ) -> Result<Vec<Word>, TransportError> {
        write(&self.calls).push(RecordedCall {
            contract,
            signature: signature.to_string(),
            args: args.to_vec(),
            sender: None,
        });
        self.check_failing(contract, signature)?;

        let key = (contract, signature.to_string());
        if let Some(words) = read(&self.exact_responses).get(&(key.clone(), args.to_vec())) {
            return Ok(words.clone());
        }
        read(&self.responses).get(&key).cloned().ok_or_else(|| {
            TransportError::call_failed(format!(
                "no response configured for {} on {}",
                signature, contract
            ))
        })
    }

    async fn submit(
        &self,
        contract: Address,
        signature: &str,
        args: &[CallArg],
        sender: Address,
    ) -> Result<TxHandle, TransportError> {
        self.check_failing(contract, signature)?;
        write(&self.submissions).push(RecordedCall {
            contract,
            signature: signature.to_string(),
            args: args.to_vec(),
            sender: Some(sender),
        });
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TxHandle::new(format!("0x{:064x}", n)))
    }
}

/// Mock rate oracle with per-oracle URLs and per-currency quotes.
#[derive(Default)]
pub struct MockRateOracle {
    urls: RwLock<HashMap<Address, String>>,
    quotes: RwLock<HashMap<(Address, Word), RateQuote>>,
    seen_data: RwLock<Vec<OracleData>>,
    unavailable: RwLock<bool>,
}

impl MockRateOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_url(&self, oracle: Address, url: impl Into<String>) {
        write(&self.urls).insert(oracle, url.into());
    }

    pub fn set_rate(&self, oracle: Address, currency: Word, rate: u128, decimals: u64) {
        write(&self.quotes).insert(
            (oracle, currency),
            RateQuote {
                rate: Word::from_u128(rate),
                decimals: Word::from_u64(decimals),
            },
        );
    }

    /// Make every call fail, as if the oracle could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        *write(&self.unavailable) = unavailable;
    }

    /// Oracle data payloads passed to `get_rate`, in call order.
    pub fn seen_data(&self) -> Vec<OracleData> {
        read(&self.seen_data).clone()
    }

    fn check_available(&self) -> Result<(), TransportError> {
        if *read(&self.unavailable) {
            return Err(TransportError::call_failed("oracle unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RateOracle for MockRateOracle {
    async fn url(&self, oracle: Address) -> Result<String, TransportError> {
        self.check_available()?;
        Ok(read(&self.urls).get(&oracle).cloned().unwrap_or_default())
    }

    async fn get_rate(
        &self,
        oracle: Address,
        currency: Word,
        data: &OracleData,
    ) -> Result<RateQuote, TransportError> {
        self.check_available()?;
        write(&self.seen_data).push(data.clone());
        read(&self.quotes)
            .get(&(oracle, currency))
            .copied()
            .ok_or_else(|| {
                TransportError::call_failed(format!("oracle {} has no rate for {}", oracle, currency))
            })
    }
}

/// Mock HTTP client serving oracle lookup tables by URL.
#[derive(Default)]
pub struct MockOracleHttp {
    tables: RwLock<HashMap<String, Vec<OracleDataEntry>>>,
    requests: AtomicU64,
}

impl MockOracleHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_table(&self, url: impl Into<String>, entries: Vec<OracleDataEntry>) {
        write(&self.tables).insert(url.into(), entries);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OracleHttp for MockOracleHttp {
    async fn get(&self, url: &str) -> Result<Vec<OracleDataEntry>, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        read(&self.tables)
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::call_failed(format!("GET {} returned 404", url)))
    }
}

/// Account provider returning a fixed address.
pub struct StaticAccount(pub Address);

#[async_trait]
impl AccountProvider for StaticAccount {
    async fn account(&self) -> Result<Address, TransportError> {
        Ok(self.0)
    }
}

/// Cosigner offering the same terms for selected loans.
#[derive(Default)]
pub struct MockCosigner {
    offers: RwLock<HashMap<u64, CosignerOffer>>,
}

impl MockCosigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offer(&self, loan_id: u64, offer: CosignerOffer) {
        write(&self.offers).insert(loan_id, offer);
    }
}

#[async_trait]
impl CosignerService for MockCosigner {
    async fn offer(&self, loan: &Loan) -> Result<Option<CosignerOffer>, TransportError> {
        Ok(read(&self.offers).get(&loan.id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Address {
        "0x00000000000000000000000000000000000000c1".parse().unwrap()
    }

    #[tokio::test]
    async fn test_exact_response_wins() {
        let ledger = MockLedger::new();
        ledger.set_response(contract(), "f()", vec![Word::from_u64(1)]);
        ledger.set_response_for(contract(), "f()", vec![CallArg::uint(2)], vec![Word::from_u64(2)]);

        let generic = ledger.call(contract(), "f()", &[CallArg::uint(9)]).await.unwrap();
        let exact = ledger.call(contract(), "f()", &[CallArg::uint(2)]).await.unwrap();
        assert_eq!(generic, vec![Word::from_u64(1)]);
        assert_eq!(exact, vec![Word::from_u64(2)]);
        assert_eq!(ledger.call_count("f()"), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_call_fails() {
        let ledger = MockLedger::new();
        let result = ledger.call(contract(), "g()", &[]).await;
        assert!(matches!(result, Err(TransportError::CallFailed { .. })));
    }

    #[tokio::test]
    async fn test_submissions_get_distinct_handles() {
        let ledger = MockLedger::new();
        let a = ledger.submit(contract(), "h()", &[], Address::ZERO).await.unwrap();
        let b = ledger.submit(contract(), "h()", &[], Address::ZERO).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(ledger.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_oracle_unavailable() {
        let oracle = MockRateOracle::new();
        oracle.set_unavailable(true);
        assert!(oracle.url(contract()).await.is_err());
    }
}
