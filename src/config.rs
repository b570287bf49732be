//! Engine configuration: contract addresses, filter contracts and curation
//! thresholds, loaded from JSON.

use crate::core::word::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Addresses of the contracts the engine talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Settlement token.
    pub token: Address,
    /// Loan engine holding the loan records.
    pub engine: Address,
    /// Read-only extension exposing bulk queries over the engine.
    pub extension: Address,
    /// Mortgage creator used as the positional parameter of mortgage filters.
    pub mortgage_creator: Address,
}

/// Addresses of the ledger-side filter contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAddresses {
    pub ongoing: Address,
    pub open_loans: Address,
    pub non_expired: Address,
    pub valid_mortgage: Address,
    pub lender_in: Address,
}

/// Thresholds applied when curating decoded loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationRules {
    /// Highest annual interest, in percent, a listed loan may carry.
    pub max_annual_interest: Decimal,
    /// Highest annual punitory interest, in percent.
    pub max_annual_punitory_interest: Decimal,
}

impl Default for CurationRules {
    fn default() -> Self {
        Self {
            max_annual_interest: dec!(1000),
            max_annual_punitory_interest: dec!(1000),
        }
    }
}

/// Full engine configuration.
///
/// # Examples
///
/// ```
/// use loan_query_engine::config::EngineConfig;
///
/// let json = r#"{
///   "contracts": {
///     "token": "0x1000000000000000000000000000000000000001",
///     "engine": "0x1000000000000000000000000000000000000002",
///     "extension": "0x1000000000000000000000000000000000000003",
///     "mortgage_creator": "0x1000000000000000000000000000000000000004"
///   },
///   "filters": {
///     "ongoing": "0x2000000000000000000000000000000000000001",
///     "open_loans": "0x2000000000000000000000000000000000000002",
///     "non_expired": "0x2000000000000000000000000000000000000003",
///     "valid_mortgage": "0x2000000000000000000000000000000000000004",
///     "lender_in": "0x2000000000000000000000000000000000000005"
///   }
/// }"#;
///
/// let config = EngineConfig::from_json_str(json).unwrap();
/// assert_eq!(config.curation.max_annual_interest.to_string(), "1000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub contracts: ContractAddresses,
    pub filters: FilterAddresses,
    #[serde(default)]
    pub curation: CurationRules,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}
