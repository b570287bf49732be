//! Application-facing façade over the query, valuation and approval
//! components, bound to one configured token/engine deployment.

use crate::approval::pending::PendingApprovals;
use crate::config::EngineConfig;
use crate::core::loan::Loan;
use crate::core::word::{Address, Word};
use crate::error::{EngineError, Result};
use crate::query::filters::QueryFilterSpec;
use crate::query::pipeline::LoanQuery;
use crate::remote::{
    AccountProvider, CallArg, CosignerService, LedgerClient, OracleData, OracleHttp, RateOracle,
    TxHandle,
};
use crate::valuation::oracle::RateOracleResolver;
use crate::valuation::withdrawal::{
    compute_pending_withdrawal, withdrawal_call_args, PendingWithdrawal, WITHDRAWAL_LIST,
};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const BALANCE_OF: &str = "balanceOf(address)";
pub const ALLOWANCE: &str = "allowance(address,address)";
pub const APPROVE: &str = "approve(address,uint256)";
pub const LEND: &str = "lend(uint256,bytes,address,bytes)";
pub const TRANSFER: &str = "transfer(address,uint256)";

/// Base units per whole settlement token.
pub const TOKEN_UNIT: Decimal = dec!(1_000_000_000_000_000_000);

/// Allowance, in base units, from which the engine counts as approved
/// (10^9 whole tokens).
pub const APPROVED_ALLOWANCE: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Allowance granted by [`LoanService::approve_engine`]: 10^32 whole
/// tokens, i.e. 10^50 base units.
pub const APPROVE_AMOUNT: Word = Word::from_bytes([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x44, 0x6c, 0x3b, 0x15, 0xf9,
    0x92, 0x66, 0x87, 0xd2, 0xc4, 0x05, 0x34, 0xfd, 0xb5, 0x64, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
]);

/// The operations the rest of the application may call.
///
/// Every operation that needs a sender identity asks the account provider
/// first. Internal state (the pending-approval table) is only reachable
/// through these methods.
pub struct LoanService {
    config: EngineConfig,
    ledger: Arc<dyn LedgerClient>,
    accounts: Arc<dyn AccountProvider>,
    query: LoanQuery,
    resolver: RateOracleResolver,
    cosigner: Option<Arc<dyn CosignerService>>,
    approvals: Arc<PendingApprovals>,
}

impl LoanService {
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn LedgerClient>,
        oracle: Arc<dyn RateOracle>,
        http: Arc<dyn OracleHttp>,
        accounts: Arc<dyn AccountProvider>,
    ) -> Self {
        let query = LoanQuery::new(Arc::clone(&ledger), config.contracts.extension);
        Self {
            query,
            resolver: RateOracleResolver::new(oracle, http),
            config,
            ledger,
            accounts,
            cosigner: None,
            approvals: Arc::new(PendingApprovals::new()),
        }
    }

    /// Ask `cosigner` for offers when lending.
    pub fn with_cosigner(mut self, cosigner: Arc<dyn CosignerService>) -> Self {
        self.cosigner = Some(cosigner);
        self
    }

    /// Share a session-wide pending-approval table.
    pub fn with_pending_approvals(mut self, approvals: Arc<PendingApprovals>) -> Self {
        self.approvals = approvals;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn engine(&self) -> Address {
        self.config.contracts.engine
    }

    fn token(&self) -> Address {
        self.config.contracts.token
    }

    // --- Queries ---

    pub async fn get_loan(&self, id: u64) -> Result<Loan> {
        self.query.get_loan(self.engine(), id).await
    }

    /// Loans being repaid. Not curated.
    pub async fn get_active_loans(&self) -> Result<Vec<Loan>> {
        let filters = QueryFilterSpec::active(
            self.config.filters.ongoing,
            self.config.contracts.mortgage_creator,
        );
        self.query.query_loans(self.engine(), &filters).await
    }

    /// Open, non-expired requests with a valid mortgage, curated.
    pub async fn get_open_loans(&self) -> Result<Vec<Loan>> {
        let filters = QueryFilterSpec::open(
            self.config.filters.open_loans,
            self.config.filters.non_expired,
            self.config.filters.valid_mortgage,
            self.config.contracts.mortgage_creator,
        );
        self.query
            .query_curated(self.engine(), &filters, &self.config.curation)
            .await
    }

    /// Loans lent by `lender`, curated.
    pub async fn get_loans_of_lender(&self, lender: Address) -> Result<Vec<Loan>> {
        let filters = QueryFilterSpec::by_lender(self.config.filters.lender_in, lender);
        self.query
            .query_curated(self.engine(), &filters, &self.config.curation)
            .await
    }

    // --- Valuation ---

    pub async fn get_oracle_data(&self, loan: &Loan) -> Result<OracleData> {
        self.resolver.get_oracle_data(loan).await
    }

    pub async fn estimate_required_amount(&self, loan: &Loan) -> Result<Decimal> {
        self.resolver.estimate_required_amount(loan).await
    }

    // --- Balances and withdrawals ---

    /// Settlement-token balance of the current account, in base units.
    pub async fn get_user_balance(&self) -> Result<Decimal> {
        let account = self.accounts.account().await?;
        let words = self
            .ledger
            .call(self.token(), BALANCE_OF, &[CallArg::Address(account)])
            .await?;
        single_word(&words, BALANCE_OF)?
            .to_decimal()
            .ok_or_else(|| EngineError::overflow("reading the token balance"))
    }

    /// Settlement-token balance of the current account, in whole tokens.
    pub async fn get_user_balance_tokens(&self) -> Result<Decimal> {
        Ok(self.get_user_balance().await? / TOKEN_UNIT)
    }

    /// Withdrawable balances of the current account as lender.
    pub async fn get_pending_withdraws(&self) -> Result<PendingWithdrawal> {
        let account = self.accounts.account().await?;
        let loans = self.get_loans_of_lender(account).await?;
        compute_pending_withdrawal(&loans)
    }

    /// Withdraw the lender balances of `loan_ids` to the current account.
    pub async fn withdraw_funds(&self, loan_ids: &[u64]) -> Result<TxHandle> {
        let account = self.accounts.account().await?;
        let args = withdrawal_call_args(loan_ids, account);
        let tx = self
            .ledger
            .submit(self.engine(), WITHDRAWAL_LIST, &args, account)
            .await?;
        info!("Submitted withdrawal of {} loans: {}", loan_ids.len(), tx);
        Ok(tx)
    }

    // --- Loan actions ---

    /// Fund `loan`, attaching oracle data and the cosigner's offer if any.
    pub async fn lend_loan(&self, loan: &Loan) -> Result<TxHandle> {
        let account = self.accounts.account().await?;
        let oracle_data = self.resolver.get_oracle_data(loan).await?;

        let offer = match &self.cosigner {
            Some(cosigner) => cosigner.offer(loan).await?,
            None => None,
        };
        let (cosigner_address, cosigner_data) = match offer {
            Some(offer) => (offer.contract, offer.lend_data),
            None => (Address::ZERO, Vec::new()),
        };

        let args = [
            CallArg::uint(loan.id),
            CallArg::Bytes(oracle_data.into_bytes()),
            CallArg::Address(cosigner_address),
            CallArg::Bytes(cosigner_data),
        ];
        let tx = self.ledger.submit(loan.engine, LEND, &args, account).await?;
        info!("Submitted lend of loan {}: {}", loan.id, tx);
        Ok(tx)
    }

    /// Transfer ownership of `loan` to `to`.
    pub async fn transfer_loan(&self, loan: &Loan, to: Address) -> Result<TxHandle> {
        let account = self.accounts.account().await?;
        let args = [CallArg::Address(to), CallArg::uint(loan.id)];
        let tx = self
            .ledger
            .submit(loan.engine, TRANSFER, &args, account)
            .await?;
        info!("Submitted transfer of loan {} to {}: {}", loan.id, to, tx);
        Ok(tx)
    }

    // --- Allowance ---

    /// Whether the engine may spend the current account's tokens.
    ///
    /// A pending approval or disapproval answers on its own; the ledger is
    /// only read when nothing is in flight for the pair.
    pub async fn is_engine_approved(&self) -> Result<bool> {
        let account = self.accounts.account().await?;
        if let Some(granting) = self.approvals.last_pending_approval(self.token(), self.engine()) {
            info!("Pending engine approval found: {}", granting);
            return Ok(granting);
        }

        let args = [CallArg::Address(account), CallArg::Address(self.engine())];
        let words = self.ledger.call(self.token(), ALLOWANCE, &args).await?;
        let allowance = single_word(&words, ALLOWANCE)?;
        Ok(allowance >= Word::from_u128(APPROVED_ALLOWANCE))
    }

    pub async fn approve_engine(&self) -> Result<TxHandle> {
        self.submit_approval(APPROVE_AMOUNT, true).await
    }

    pub async fn disapprove_engine(&self) -> Result<TxHandle> {
        self.submit_approval(Word::ZERO, false).await
    }

    /// Clear the pending approval registered for `tx` once it is settled.
    ///
    /// Called by the transaction-status watcher on confirmation or failure.
    pub fn settle_approval(&self, tx: &TxHandle) -> bool {
        self.approvals.resolve(self.token(), self.engine(), tx)
    }

    async fn submit_approval(&self, amount: Word, granting: bool) -> Result<TxHandle> {
        let account = self.accounts.account().await?;
        let args = [CallArg::Address(self.engine()), CallArg::Uint(amount)];
        let tx = self
            .ledger
            .submit(self.token(), APPROVE, &args, account)
            .await?;
        self.approvals
            .register_approval(self.token(), self.engine(), granting, tx.clone());
        info!(
            "Submitted engine {}: {}",
            if granting { "approval" } else { "disapproval" },
            tx
        );
        Ok(tx)
    }
}

fn single_word(words: &[Word], signature: &str) -> Result<Word> {
    match words {
        [word] => Ok(*word),
        _ => Err(EngineError::malformed(format!(
            "{} returned {} words, expected 1",
            signature,
            words.len()
        ))),
    }
}
