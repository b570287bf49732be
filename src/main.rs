//! loan-query-engine CLI
//!
//! Inspect raw loan query results offline.
//!
//! # Usage
//!
//! ```bash
//! # Decode a JSON array of hex words returned by queryLoans
//! loan-query-engine decode --engine 0x... --input words.json
//!
//! # Same, curated, as JSON
//! loan-query-engine decode --engine 0x... --input words.json --curate --format json
//!
//! # Show the filter presets of a deployment
//! loan-query-engine presets --config engine.json
//!
//! # Withdrawable lender balances in a query result
//! loan-query-engine withdrawals --engine 0x... --input words.json
//!
//! # Required settlement amount for a loan
//! loan-query-engine estimate --amount 1000 --rate 2500000 --decimals 6
//! ```

use loan_query_engine::codec::record::decode_loan_batch;
use loan_query_engine::config::{CurationRules, EngineConfig};
use loan_query_engine::core::loan::Loan;
use loan_query_engine::core::word::{Address, Word};
use loan_query_engine::query::curation::curate_loans;
use loan_query_engine::query::filters::QueryFilterSpec;
use loan_query_engine::valuation::rate::required_amount;
use loan_query_engine::valuation::withdrawal::compute_pending_withdrawal;
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"loan-query-engine — decode, filter and value ledger loan records

USAGE:
    loan-query-engine <COMMAND> [OPTIONS]

COMMANDS:
    decode       Decode a queryLoans result into loans
    presets      Print the active/open/by-lender filter presets
    withdrawals  Compute withdrawable lender balances of a query result
    estimate     Compute the settlement amount required to fund a loan
    help         Show this message

OPTIONS (decode, withdrawals):
    --engine <ADDR>     Loan engine address the records belong to
    --input <FILE>      JSON array of hex words
    --format <FORMAT>   Output format: text (default) or json
    --curate            (decode) Drop inconsistent loans

OPTIONS (presets):
    --config <FILE>     Engine configuration JSON
    --lender <ADDR>     Lender for the by-lender preset (default: zero address)

OPTIONS (estimate):
    --amount <N>        Loan amount in its own currency
    --rate <N>          Oracle rate
    --decimals <D>      Oracle rate decimals (0-18)

EXAMPLES:
    loan-query-engine decode --engine 0x5e5a... --input words.json --curate
    loan-query-engine presets --config engine.json
    loan-query-engine estimate --amount 1000 --rate 2500000 --decimals 6"#
    );
}

/// Options shared by the commands; each command reads the ones it needs.
#[derive(Default)]
struct Options {
    engine: Option<String>,
    input: Option<String>,
    config: Option<String>,
    lender: Option<String>,
    amount: Option<String>,
    rate: Option<String>,
    decimals: Option<String>,
    format: Option<String>,
    curate: bool,
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--curate" {
            options.curate = true;
            i += 1;
            continue;
        }
        let slot = match flag {
            "--engine" => &mut options.engine,
            "--input" => &mut options.input,
            "--config" => &mut options.config,
            "--lender" => &mut options.lender,
            "--amount" => &mut options.amount,
            "--rate" => &mut options.rate,
            "--decimals" => &mut options.decimals,
            "--format" => &mut options.format,
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        };
        i += 1;
        *slot = Some(args.get(i).cloned().unwrap_or_else(|| {
            eprintln!("{} requires a value", flag);
            process::exit(1);
        }));
        i += 1;
    }
    options
}

fn required(value: Option<String>, flag: &str) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Error: {} is required", flag);
        process::exit(1);
    })
}

fn parse_address(value: &str) -> Address {
    value.parse().unwrap_or_else(|e| {
        eprintln!("Invalid address '{}': {}", value, e);
        process::exit(1);
    })
}

fn load_loans(options: &Options) -> Vec<Loan> {
    let engine = parse_address(&required(options.engine.clone(), "--engine"));
    let path = required(options.input.clone(), "--input");

    let content = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    let words: Vec<Word> = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(r#"["0x1", "0x0000...aa", ...]"#);
        process::exit(1);
    });

    decode_loan_batch(engine, &words).unwrap_or_else(|e| {
        eprintln!("Error decoding loans: {}", e);
        process::exit(1);
    })
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding JSON: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_decode(args: &[String]) {
    let options = parse_options(args);
    let mut loans = load_loans(&options);
    if options.curate {
        loans = curate_loans(loans, &CurationRules::default());
    }

    if options.format.as_deref() == Some("json") {
        print_json(&loans);
        return;
    }

    if loans.is_empty() {
        println!("No loans.");
        return;
    }
    for loan in &loans {
        println!("Loan #{} ({})", loan.id, loan.status);
        println!("  Amount:         {} {}", loan.raw_amount, display_currency(loan));
        println!("  Oracle:         {}", loan.oracle);
        println!("  Borrower:       {}", loan.borrower);
        println!("  Lender:         {}", loan.lender);
        if let Some(annual) = loan.annual_interest() {
            println!("  Interest:       {}% a year", annual.round_dp(2));
        }
        println!("  Lender balance: {}", loan.lender_balance);
        if let Some(expires) = loan.expires_at() {
            println!("  Expires:        {}", expires);
        }
    }
    println!("\nTotal loans: {}", loans.len());
}

fn display_currency(loan: &Loan) -> &str {
    if loan.currency_raw.is_empty() {
        "(settlement token)"
    } else {
        &loan.currency_raw
    }
}

fn cmd_presets(args: &[String]) {
    let options = parse_options(args);
    let path = required(options.config, "--config");
    let config = EngineConfig::load(&path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        process::exit(1);
    });
    let lender = options
        .lender
        .as_deref()
        .map(parse_address)
        .unwrap_or(Address::ZERO);

    let presets = [
        (
            "active",
            QueryFilterSpec::active(config.filters.ongoing, config.contracts.mortgage_creator),
        ),
        (
            "open",
            QueryFilterSpec::open(
                config.filters.open_loans,
                config.filters.non_expired,
                config.filters.valid_mortgage,
                config.contracts.mortgage_creator,
            ),
        ),
        (
            "by-lender",
            QueryFilterSpec::by_lender(config.filters.lender_in, lender),
        ),
    ];

    for (name, spec) in &presets {
        println!("Preset: {}", name);
        for (i, filter) in spec.filters().iter().enumerate() {
            println!("  filter[{}] {}", i, filter);
        }
        for (i, param) in spec.params().iter().enumerate() {
            println!("  param[{}]  {}", i, param);
        }
    }
}

fn cmd_withdrawals(args: &[String]) {
    let options = parse_options(args);
    let loans = curate_loans(load_loans(&options), &CurationRules::default());
    let pending = compute_pending_withdrawal(&loans).unwrap_or_else(|e| {
        eprintln!("Error computing withdrawals: {}", e);
        process::exit(1);
    });

    if options.format.as_deref() == Some("json") {
        print_json(&pending);
    } else {
        println!("{}", pending);
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let raw = required(value, flag);
    raw.parse().unwrap_or_else(|e| {
        eprintln!("Invalid value '{}' for {}: {}", raw, flag, e);
        process::exit(1);
    })
}

fn cmd_estimate(args: &[String]) {
    let options = parse_options(args);
    let amount: Decimal = parse_number(options.amount, "--amount");
    let rate: Decimal = parse_number(options.rate, "--rate");
    let decimals: u64 = parse_number(options.decimals, "--decimals");

    match required_amount(amount, rate, decimals) {
        Ok(required) => println!("Required: {}", required),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "decode" => cmd_decode(rest),
        "presets" => cmd_presets(rest),
        "withdrawals" => cmd_withdrawals(rest),
        "estimate" => cmd_estimate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
