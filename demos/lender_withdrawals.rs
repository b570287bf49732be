//! Collect a lender's withdrawable balances and manage the engine
//! allowance.

use loan_query_engine::codec::record::encode_loan;
use loan_query_engine::config::EngineConfig;
use loan_query_engine::core::loan::{Loan, LoanStatus};
use loan_query_engine::core::word::{Address, Word};
use loan_query_engine::query::pipeline::QUERY_LOANS;
use loan_query_engine::remote::mock::{MockLedger, MockOracleHttp, MockRateOracle, StaticAccount};
use loan_query_engine::service::{LoanService, ALLOWANCE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const CONFIG: &str = r#"{
  "contracts": {
    "token": "0x1000000000000000000000000000000000000001",
    "engine": "0x1000000000000000000000000000000000000002",
    "extension": "0x1000000000000000000000000000000000000003",
    "mortgage_creator": "0x1000000000000000000000000000000000000004"
  },
  "filters": {
    "ongoing": "0x2000000000000000000000000000000000000001",
    "open_loans": "0x2000000000000000000000000000000000000002",
    "non_expired": "0x2000000000000000000000000000000000000003",
    "valid_mortgage": "0x2000000000000000000000000000000000000004",
    "lender_in": "0x2000000000000000000000000000000000000005"
  },
  "curation": {
    "max_annual_interest": "200",
    "max_annual_punitory_interest": "300"
  }
}"#;

fn lent(id: u64, engine: Address, lender: Address, balance: Decimal) -> Loan {
    Loan {
        id,
        engine,
        status: LoanStatus::Ongoing,
        oracle: Address::ZERO,
        borrower: Address::ZERO,
        lender,
        creator: Address::ZERO,
        cosigner: Address::ZERO,
        raw_amount: dec!(1000),
        interest: dec!(25),
        punitory_interest: Decimal::ZERO,
        interest_timestamp: 1_700_000_000,
        paid: balance,
        interest_rate: 10_368_000_000_000,
        interest_rate_punitory: 6_912_000_000_000,
        due_time: 1_710_000_000,
        dues_in: 90 * 86_400,
        currency: Word::ZERO,
        currency_raw: String::new(),
        cancelable_at: 0,
        lender_balance: balance,
        expiration_requests: 1_700_000_000,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("╔═════════════════════════════════════════════╗");
    println!("║  loan-query-engine: Lender Withdrawals      ║");
    println!("╚═════════════════════════════════════════════╝\n");

    let config = EngineConfig::from_json_str(CONFIG)?;
    let engine = config.contracts.engine;
    let token = config.contracts.token;
    let lender: Address = "0x3000000000000000000000000000000000000001".parse()?;

    let mut words = Vec::new();
    for (id, balance) in [(10, dec!(0)), (11, dec!(5)), (12, dec!(0)), (13, dec!(3))] {
        words.extend(encode_loan(&lent(id, engine, lender, balance))?);
    }

    let ledger = Arc::new(MockLedger::new());
    ledger.set_response(config.contracts.extension, QUERY_LOANS, words);
    ledger.set_response(token, ALLOWANCE, vec![Word::ZERO]);

    let service = LoanService::new(
        config,
        ledger.clone(),
        Arc::new(MockRateOracle::new()),
        Arc::new(MockOracleHttp::new()),
        Arc::new(StaticAccount(lender)),
    );

    // --- Scenario 1: Withdraw lender balances ---
    println!("━━━ Scenario 1: Pending withdrawals ━━━\n");

    let pending = service.get_pending_withdraws().await?;
    println!("{}", pending);
    if !pending.is_empty() {
        let tx = service.withdraw_funds(&pending.loan_ids).await?;
        println!("Withdrawal submitted: {}\n", tx);
    }

    // --- Scenario 2: Engine allowance ---
    println!("━━━ Scenario 2: Engine allowance ━━━\n");

    println!("Approved before:   {}", service.is_engine_approved().await?);
    let tx = service.approve_engine().await?;
    println!("Approval submitted: {}", tx);
    println!("Approved (pending): {}", service.is_engine_approved().await?);
    println!("Allowance reads:    {}", ledger.call_count(ALLOWANCE));

    // Confirmation arrives; the ledger is authoritative again.
    service.settle_approval(&tx);
    println!("Approved (settled): {}", service.is_engine_approved().await?);

    Ok(())
}
