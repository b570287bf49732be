use crate::core::loan::Loan;
use crate::error::{EngineError, Result};
use crate::remote::{OracleData, OracleDataEntry, OracleHttp, RateOracle};
use crate::valuation::rate::required_amount;
use log::{debug, info, warn};
use std::sync::Arc;

/// Prices loans in settlement-token units through their rate oracles.
///
/// Holds no per-call state, so concurrent estimations never share
/// anything beyond the collaborator handles.
#[derive(Clone)]
pub struct RateOracleResolver {
    oracle: Arc<dyn RateOracle>,
    http: Arc<dyn OracleHttp>,
}

impl RateOracleResolver {
    pub fn new(oracle: Arc<dyn RateOracle>, http: Arc<dyn OracleHttp>) -> Self {
        Self { oracle, http }
    }

    /// Payload the loan's oracle needs alongside a rate request.
    ///
    /// An oracle without a lookup URL needs no payload, which is not an
    /// error. Transport failures surface as
    /// [`EngineError::OracleUnavailable`].
    pub async fn get_oracle_data(&self, loan: &Loan) -> Result<OracleData> {
        if !loan.has_oracle() {
            return Ok(OracleData::empty());
        }

        let url = self
            .oracle
            .url(loan.oracle)
            .await
            .map_err(|source| EngineError::OracleUnavailable { source })?;
        if url.is_empty() {
            return Ok(OracleData::empty());
        }

        let entries = self
            .http
            .get(&url)
            .await
            .map_err(|source| EngineError::OracleUnavailable { source })?;
        debug!("Searching currency {:?} in {} oracle entries", loan.currency_raw, entries.len());
        select_oracle_data(&entries, &loan.currency_raw)
    }

    /// Settlement-token amount required to fully fund `loan`.
    pub async fn estimate_required_amount(&self, loan: &Loan) -> Result<rust_decimal::Decimal> {
        if !loan.has_oracle() {
            return Ok(loan.raw_amount);
        }

        let data = self.get_oracle_data(loan).await?;
        let quote = self
            .oracle
            .get_rate(loan.oracle, loan.currency, &data)
            .await
            .map_err(|source| EngineError::OracleUnavailable { source })?;

        let decimals = quote
            .decimals
            .to_u64()
            .ok_or(EngineError::UnsupportedOraclePrecision { decimals: u64::MAX })?;
        let rate = quote
            .rate
            .to_decimal()
            .ok_or_else(|| EngineError::overflow("reading the oracle rate"))?;
        info!("Oracle rate obtained for loan {}: {} ({} decimals)", loan.id, rate, decimals);

        let required = required_amount(loan.raw_amount, rate, decimals)?;
        info!("Estimated required amount for loan {} is {}", loan.id, required);
        Ok(required)
    }
}

/// Payload of the entry whose currency is `currency`.
///
/// When the table repeats a currency the last entry wins.
pub fn select_oracle_data(entries: &[OracleDataEntry], currency: &str) -> Result<OracleData> {
    let Some(entry) = entries.iter().rev().find(|e| e.currency == currency) else {
        warn!("Oracle did not provide data for {:?}", currency);
        return Err(EngineError::OracleDataMissing {
            currency: currency.to_string(),
        });
    };

    let digits = entry.data.strip_prefix("0x").unwrap_or(&entry.data);
    let bytes = hex::decode(digits).map_err(|e| EngineError::InvalidOracleData {
        currency: currency.to_string(),
        reason: e.to_string(),
    })?;
    debug!("Oracle data found for {:?}: {}", currency, entry.data);
    Ok(OracleData::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loan::LoanStatus;
    use crate::core::word::{Address, Word};
    use crate::remote::mock::{MockOracleHttp, MockRateOracle};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const URL: &str = "https://oracle.example/rates";

    fn oracle_address() -> Address {
        "0x00000000000000000000000000000000000000aa".parse().unwrap()
    }

    fn entry(currency: &str, data: &str) -> OracleDataEntry {
        OracleDataEntry {
            currency: currency.to_string(),
            data: data.to_string(),
        }
    }

    fn loan(currency: &str, oracle: Address) -> Loan {
        Loan {
            id: 1,
            engine: Address::ZERO,
            status: LoanStatus::Request,
            oracle,
            borrower: Address::ZERO,
            lender: Address::ZERO,
            creator: Address::ZERO,
            cosigner: Address::ZERO,
            raw_amount: dec!(1000),
            interest: Decimal::ZERO,
            punitory_interest: Decimal::ZERO,
            interest_timestamp: 0,
            paid: Decimal::ZERO,
            interest_rate: 1,
            interest_rate_punitory: 0,
            due_time: 0,
            dues_in: 0,
            currency: Word::from_ascii_code(currency).unwrap(),
            currency_raw: currency.to_string(),
            cancelable_at: 0,
            lender_balance: Decimal::ZERO,
            expiration_requests: 0,
        }
    }

    fn resolver() -> (RateOracleResolver, Arc<MockRateOracle>, Arc<MockOracleHttp>) {
        let oracle = Arc::new(MockRateOracle::new());
        let http = Arc::new(MockOracleHttp::new());
        let resolver = RateOracleResolver::new(oracle.clone(), http.clone());
        (resolver, oracle, http)
    }

    #[test]
    fn test_select_matching_currency() {
        let entries = vec![entry("USD", "0xAA"), entry("EUR", "0xBB")];
        let data = select_oracle_data(&entries, "EUR").unwrap();
        assert_eq!(data.as_bytes(), &[0xbb]);
    }

    #[test]
    fn test_select_missing_currency() {
        let entries = vec![entry("USD", "0xAA"), entry("EUR", "0xBB")];
        let result = select_oracle_data(&entries, "JPY");
        assert!(matches!(result, Err(EngineError::OracleDataMissing { .. })));
    }

    #[test]
    fn test_select_last_duplicate_wins() {
        let entries = vec![entry("EUR", "0x01"), entry("EUR", "0x02")];
        assert_eq!(select_oracle_data(&entries, "EUR").unwrap().as_bytes(), &[0x02]);
    }

    #[test]
    fn test_select_invalid_hex() {
        let entries = vec![entry("EUR", "0xnothex")];
        assert!(matches!(
            select_oracle_data(&entries, "EUR"),
            Err(EngineError::InvalidOracleData { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_oracle_returns_raw_amount() {
        let (resolver, oracle, http) = resolver();
        oracle.set_unavailable(true);
        let loan = loan("", Address::ZERO);

        let required = resolver.estimate_required_amount(&loan).await.unwrap();
        assert_eq!(required, dec!(1000));
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_url_means_empty_data() {
        let (resolver, oracle, http) = resolver();
        oracle.set_url(oracle_address(), "");
        let data = resolver
            .get_oracle_data(&loan("ARS", oracle_address()))
            .await
            .unwrap();
        assert!(data.is_empty());
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_estimate_with_lookup_table() {
        let (resolver, oracle, http) = resolver();
        let loan = loan("EUR", oracle_address());
        oracle.set_url(oracle_address(), URL);
        oracle.set_rate(oracle_address(), loan.currency, 2_500_000, 6);
        http.set_table(URL, vec![entry("USD", "0xAA"), entry("EUR", "0xBB")]);

        let required = resolver.estimate_required_amount(&loan).await.unwrap();
        assert_eq!(required, dec!(2550));
        assert_eq!(oracle.seen_data(), vec![OracleData::new(vec![0xbb])]);
    }

    #[tokio::test]
    async fn test_estimate_rejects_precision_above_base() {
        let (resolver, oracle, _http) = resolver();
        let loan = loan("EUR", oracle_address());
        oracle.set_rate(oracle_address(), loan.currency, 2, 19);

        let result = resolver.estimate_required_amount(&loan).await;
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedOraclePrecision { decimals: 19 })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_oracle_is_unavailable() {
        let (resolver, oracle, _http) = resolver();
        oracle.set_unavailable(true);

        let result = resolver
            .estimate_required_amount(&loan("EUR", oracle_address()))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, EngineError::OracleUnavailable { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_http_failure_is_unavailable() {
        let (resolver, oracle, _http) = resolver();
        oracle.set_url(oracle_address(), URL);

        let result = resolver.get_oracle_data(&loan("EUR", oracle_address())).await;
        assert!(matches!(result, Err(EngineError::OracleUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_missing_currency_is_permanent() {
        let (resolver, oracle, http) = resolver();
        oracle.set_url(oracle_address(), URL);
        http.set_table(URL, vec![entry("USD", "0xAA")]);

        let err = resolver
            .estimate_required_amount(&loan("JPY", oracle_address()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OracleDataMissing { .. }));
        assert!(!err.is_transient());
    }
}
