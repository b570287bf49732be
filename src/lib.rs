//! # loan-query-engine
//!
//! Client-side query and valuation engine for ledger-resident loan
//! contracts.
//!
//! Given raw words returned by a loan engine's bulk queries, this crate
//! decodes them into loans, selects subsets through ledger filters,
//! prices loans through rate oracles in fixed-point arithmetic, batches
//! lender withdrawals, and keeps redundant allowance grants from being
//! submitted twice.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: ledger words, addresses, loans
//! - **codec** — Fixed-width loan record decoding and encoding
//! - **query** — Filter presets, bulk queries and curation
//! - **valuation** — Oracle pricing and withdrawal aggregation
//! - **approval** — In-flight allowance change tracking
//! - **remote** — Collaborator contracts (ledger, oracle, HTTP, cosigner, account)
//! - **service** — The façade the application calls

pub mod approval;
pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod query;
pub mod remote;
pub mod service;
pub mod valuation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::approval::pending::PendingApprovals;
    pub use crate::codec::record::{decode_loan, decode_loan_batch, encode_address_as_word};
    pub use crate::config::EngineConfig;
    pub use crate::core::loan::{Loan, LoanStatus};
    pub use crate::core::word::{Address, Word};
    pub use crate::error::{EngineError, Result, TransportError};
    pub use crate::query::filters::QueryFilterSpec;
    pub use crate::service::LoanService;
    pub use crate::valuation::withdrawal::{compute_pending_withdrawal, PendingWithdrawal};
}
