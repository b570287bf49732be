//! Browse open loan requests and price them.
//!
//! Wires the service to in-memory collaborators seeded with three
//! requests, one of which is inconsistent and dropped by curation.

use loan_query_engine::codec::record::encode_loan;
use loan_query_engine::config::EngineConfig;
use loan_query_engine::core::loan::{Loan, LoanStatus};
use loan_query_engine::core::word::{Address, Word};
use loan_query_engine::query::pipeline::QUERY_LOANS;
use loan_query_engine::remote::mock::{MockLedger, MockOracleHttp, MockRateOracle, StaticAccount};
use loan_query_engine::remote::OracleDataEntry;
use loan_query_engine::service::LoanService;
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
  }
}"#;

const ORACLE_URL: &str = "https://oracle.example/ars";

fn request(id: u64, engine: Address, oracle: Address, currency: &str, amount: Decimal, rate: u64) -> Loan {
    let mut borrower = [0u8; 20];
    borrower[19] = id as u8;
    Loan {
        id,
        engine,
        status: LoanStatus::Request,
        oracle,
        borrower: Address::from_bytes(borrower),
        lender: Address::ZERO,
        creator: Address::from_bytes(borrower),
        cosigner: Address::ZERO,
        raw_amount: amount,
        interest: Decimal::ZERO,
        punitory_interest: Decimal::ZERO,
        interest_timestamp: 0,
        paid: Decimal::ZERO,
        interest_rate: rate,
        interest_rate_punitory: rate * 2 / 3,
        due_time: 0,
        dues_in: 90 * 86_400,
        currency: Word::from_ascii_code(currency).unwrap_or(Word::ZERO),
        currency_raw: currency.to_string(),
        cancelable_at: 30 * 86_400,
        lender_balance: Decimal::ZERO,
        expiration_requests: 1_900_000_000,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("╔═════════════════════════════════════════════╗");
    println!("║  loan-query-engine: Open Loans Example      ║");
    println!("╚═════════════════════════════════════════════╝\n");

    let config = EngineConfig::from_json_str(CONFIG)?;
    let engine = config.contracts.engine;
    let oracle: Address = "0x4000000000000000000000000000000000000001".parse()?;

    // --- Ledger state ---
    let loans = vec![
        // 1000 pesos at 30% a year
        request(1, engine, oracle, "ARS", dec!(1000), 10_368_000_000_000),
        // 0% interest, dropped by curation
        request(2, engine, oracle, "ARS", dec!(500), 0),
        // Already in settlement tokens
        request(3, engine, Address::ZERO, "", dec!(250), 6_220_800_000_000),
    ];
    let mut words = Vec::new();
    for loan in &loans {
        words.extend(encode_loan(loan)?);
    }

    let ledger = Arc::new(MockLedger::new());
    ledger.set_response(config.contracts.extension, QUERY_LOANS, words);

    let rates = Arc::new(MockRateOracle::new());
    rates.set_url(oracle, ORACLE_URL);
    // 0.005 tokens per peso
    rates.set_rate(oracle, Word::from_ascii_code("ARS").unwrap_or(Word::ZERO), 5_000_000, 9);

    let http = Arc::new(MockOracleHttp::new());
    http.set_table(
        ORACLE_URL,
        vec![OracleDataEntry {
            currency: "ARS".into(),
            data: "0x01a4".into(),
        }],
    );

    let account = Arc::new(StaticAccount("0x3000000000000000000000000000000000000001".parse()?));
    let service = LoanService::new(config, ledger, rates, http, account);

    // --- Query and price ---
    println!("━━━ Open requests ━━━\n");
    let open = service.get_open_loans().await?;
    for loan in &open {
        let currency = if loan.currency_raw.is_empty() {
            "tokens"
        } else {
            loan.currency_raw.as_str()
        };
        let required = service.estimate_required_amount(loan).await?;
        println!("Loan #{}: {} {}", loan.id, loan.raw_amount, currency);
        if let Some(annual) = loan.annual_interest() {
            println!("  Interest:  {}% a year", annual.round_dp(2));
        }
        println!("  Oracle data: {}", service.get_oracle_data(loan).await?);
        println!("  Required:  {} tokens\n", required);
    }

    println!("{} of {} requests survive curation", open.len(), loans.len());
    Ok(())
}
