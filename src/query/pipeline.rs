use crate::codec::record::{decode_loan, decode_loan_batch};
use crate::config::CurationRules;
use crate::core::loan::Loan;
use crate::core::word::Address;
use crate::error::{EngineError, Result};
use crate::query::curation::curate_loans;
use crate::query::filters::QueryFilterSpec;
use crate::remote::{CallArg, LedgerClient};
use log::debug;
use std::sync::Arc;

pub const QUERY_LOANS: &str = "queryLoans(address,uint256,uint256,address[],bytes32[])";
pub const GET_LOAN: &str = "getLoan(address,uint256)";

/// Runs filtered bulk queries against the engine extension contract.
///
/// Stateless apart from its collaborator handle; any number of queries
/// may be in flight at once.
#[derive(Clone)]
pub struct LoanQuery {
    ledger: Arc<dyn LedgerClient>,
    extension: Address,
}

impl LoanQuery {
    pub fn new(ledger: Arc<dyn LedgerClient>, extension: Address) -> Self {
        Self { ledger, extension }
    }

    /// Query `engine` with `filters` and decode the result.
    ///
    /// Loans come back in ledger order; nothing is re-sorted or curated.
    pub async fn query_loans(&self, engine: Address, filters: &QueryFilterSpec) -> Result<Vec<Loan>> {
        let args = filters.to_call_args(engine);
        let words = self.ledger.call(self.extension, QUERY_LOANS, &args).await?;
        debug!(
            "Query with {} filters returned {} words",
            filters.filters().len(),
            words.len()
        );
        decode_loan_batch(engine, &words)
    }

    /// Query, then curate with `rules`.
    pub async fn query_curated(
        &self,
        engine: Address,
        filters: &QueryFilterSpec,
        rules: &CurationRules,
    ) -> Result<Vec<Loan>> {
        let loans = self.query_loans(engine, filters).await?;
        Ok(curate_loans(loans, rules))
    }

    /// Fetch one loan; an empty result is [`EngineError::LoanNotFound`].
    pub async fn get_loan(&self, engine: Address, id: u64) -> Result<Loan> {
        let args = [CallArg::Address(engine), CallArg::uint(id)];
        let words = self.ledger.call(self.extension, GET_LOAN, &args).await?;
        if words.is_empty() {
            return Err(EngineError::LoanNotFound { id });
        }
        decode_loan(engine, id, &words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::record::{offset, RECORD_WORDS};
    use crate::core::word::Word;
    use crate::error::TransportError;
    use crate::remote::mock::MockLedger;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from_bytes(bytes)
    }

    fn record(id: u64) -> Vec<Word> {
        let mut record = vec![Word::ZERO; RECORD_WORDS];
        record[offset::INTEREST_RATE] = Word::from_u64(10_368_000_000_000);
        record[offset::ID] = Word::from_u64(id);
        record
    }

    #[tokio::test]
    async fn test_query_passes_args_verbatim() {
        let ledger = Arc::new(MockLedger::new());
        let mut words = record(3);
        words.extend(record(1));
        ledger.set_response(addr(0xe3), QUERY_LOANS, words);

        let query = LoanQuery::new(ledger.clone(), addr(0xe3));
        let spec = QueryFilterSpec::active(addr(1), addr(2));
        let loans = query.query_loans(addr(0xe1), &spec).await.unwrap();

        assert_eq!(loans.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 1]);
        let calls = ledger.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].contract, addr(0xe3));
        assert_eq!(calls[0].args, spec.to_call_args(addr(0xe1)));
    }

    #[tokio::test]
    async fn test_misaligned_query_result_fails() {
        let ledger = Arc::new(MockLedger::new());
        let mut words = record(3);
        words.push(Word::ZERO);
        ledger.set_response(addr(0xe3), QUERY_LOANS, words);

        let query = LoanQuery::new(ledger, addr(0xe3));
        let result = query
            .query_loans(addr(0xe1), &QueryFilterSpec::default())
            .await;
        assert!(matches!(result, Err(EngineError::MalformedRecord { .. })));
    }

    #[tokio::test]
    async fn test_get_loan_empty_is_not_found() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_response(addr(0xe3), GET_LOAN, vec![]);

        let query = LoanQuery::new(ledger, addr(0xe3));
        let result = query.get_loan(addr(0xe1), 44).await;
        assert!(matches!(result, Err(EngineError::LoanNotFound { id: 44 })));
    }

    #[tokio::test]
    async fn test_get_loan_transport_failure_is_not_not_found() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail(addr(0xe3), GET_LOAN);

        let query = LoanQuery::new(ledger, addr(0xe3));
        let result = query.get_loan(addr(0xe1), 44).await;
        assert!(matches!(
            result,
            Err(EngineError::Transport(TransportError::CallFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_get_loan_decodes_record() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_response_for(
            addr(0xe3),
            GET_LOAN,
            vec![CallArg::Address(addr(0xe1)), CallArg::uint(8)],
            record(8),
        );

        let query = LoanQuery::new(ledger, addr(0xe3));
        let loan = query.get_loan(addr(0xe1), 8).await.unwrap();
        assert_eq!(loan.id, 8);
        assert_eq!(loan.engine, addr(0xe1));
    }
}
