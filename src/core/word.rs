use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of one ledger word in bytes.
pub const WORD_BYTES: usize = 32;

/// Width of an address in bytes.
pub const ADDRESS_BYTES: usize = 20;

/// Errors arising from parsing hex words and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("hex value is missing the 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("hex value {value} is longer than {max} digits")]
    TooLong { value: String, max: usize },
    #[error("address {0} must have exactly 40 hex digits")]
    AddressLength(String),
    #[error("invalid hex digits in {value}: {reason}")]
    InvalidDigits { value: String, reason: String },
}

fn strip_prefix(value: &str) -> Result<&str, HexError> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| HexError::MissingPrefix(value.to_string()))
}

fn decode_digits(value: &str, digits: &str) -> Result<Vec<u8>, HexError> {
    hex::decode(digits).map_err(|e| HexError::InvalidDigits {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// A 32-byte big-endian ledger word.
///
/// Bulk query results, call arguments and numeric values all travel as
/// words. Short hex strings such as `0x0` are left-padded on parse.
///
/// # Examples
///
/// ```
/// use loan_query_engine::core::word::Word;
///
/// let word: Word = "0x1f".parse().unwrap();
/// assert_eq!(word.to_u64(), Some(31));
/// assert_eq!(Word::ZERO, "0x0".parse().unwrap());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word([u8; WORD_BYTES]);

impl Word {
    pub const ZERO: Word = Word([0; WORD_BYTES]);

    pub const fn from_bytes(bytes: [u8; WORD_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; WORD_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_u128(u128::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; WORD_BYTES];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Interpret the word as an unsigned integer, if it fits in 128 bits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    /// Interpret the word as an unsigned integer, if it fits in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Interpret the word as an integer amount of base units.
    ///
    /// Returns `None` when the value exceeds the 96-bit mantissa of
    /// [`Decimal`].
    pub fn to_decimal(&self) -> Option<Decimal> {
        let value = i128::try_from(self.to_u128()?).ok()?;
        Decimal::try_from_i128_with_scale(value, 0).ok()
    }

    /// Encode a non-negative integral decimal as a word.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        if value.fract() != Decimal::ZERO {
            return None;
        }
        let mantissa = value.trunc().mantissa();
        let scale = value.trunc().scale();
        let integral = mantissa.checked_div(10i128.checked_pow(scale)?)?;
        u128::try_from(integral).ok().map(Self::from_u128)
    }

    /// The low 20 bytes of the word as an address.
    pub fn to_address(&self) -> Address {
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes.copy_from_slice(&self.0[WORD_BYTES - ADDRESS_BYTES..]);
        Address(bytes)
    }

    /// Encode an ASCII currency code as a left-aligned, zero-padded word.
    pub fn from_ascii_code(code: &str) -> Option<Self> {
        let raw = code.as_bytes();
        if raw.len() > WORD_BYTES || !raw.iter().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        let mut bytes = [0u8; WORD_BYTES];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self(bytes))
    }

    /// Decode a left-aligned, zero-padded ASCII currency code.
    ///
    /// The zero word decodes to the empty code. Returns `None` if a
    /// non-printable byte appears before the padding, or if a non-zero
    /// byte appears after it.
    pub fn to_ascii_code(&self) -> Option<String> {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(WORD_BYTES);
        let (code, padding) = self.0.split_at(end);
        if padding.iter().any(|b| *b != 0) || !code.iter().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        String::from_utf8(code.to_vec()).ok()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self)
    }
}

impl FromStr for Word {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_prefix(s)?;
        if digits.len() > WORD_BYTES * 2 {
            return Err(HexError::TooLong {
                value: s.to_string(),
                max: WORD_BYTES * 2,
            });
        }
        let padded = format!("{:0>width$}", digits, width = WORD_BYTES * 2);
        let decoded = decode_digits(s, &padded)?;
        let mut bytes = [0u8; WORD_BYTES];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Word {
    type Error = HexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.to_string()
    }
}

/// A 20-byte ledger account or contract address.
///
/// The zero address doubles as the "no oracle" sentinel on loans.
///
/// # Examples
///
/// ```
/// use loan_query_engine::core::word::Address;
///
/// let addr: Address = "0x2222222222222222222222222222222222222222".parse().unwrap();
/// assert!(!addr.is_zero());
/// assert!(Address::ZERO.is_zero());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const ZERO: Address = Address([0; ADDRESS_BYTES]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_prefix(s)?;
        if digits.len() != ADDRESS_BYTES * 2 {
            return Err(HexError::AddressLength(s.to_string()));
        }
        let decoded = decode_digits(s, digits)?;
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = HexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_short_hex_is_left_padded() {
        let word: Word = "0x0".parse().unwrap();
        assert_eq!(word, Word::ZERO);

        let word: Word = "0xabc".parse().unwrap();
        assert_eq!(word.to_u64(), Some(0xabc));
    }

    #[test]
    fn test_word_display_is_full_width() {
        let word = Word::from_u64(1);
        let text = word.to_string();
        assert_eq!(text.len(), 2 + 64);
        assert!(text.ends_with("01"));
    }

    #[test]
    fn test_word_rejects_missing_prefix_and_overflow() {
        assert!(matches!("12".parse::<Word>(), Err(HexError::MissingPrefix(_))));
        let long = format!("0x{}", "1".repeat(65));
        assert!(matches!(long.parse::<Word>(), Err(HexError::TooLong { .. })));
        assert!(matches!("0xzz".parse::<Word>(), Err(HexError::InvalidDigits { .. })));
    }

    #[test]
    fn test_word_decimal_conversion() {
        let word = Word::from_u128(5_000_000_000_000_000_000);
        assert_eq!(word.to_decimal(), Some(dec!(5_000_000_000_000_000_000)));
        assert_eq!(Word::from_decimal(dec!(42)), Some(Word::from_u64(42)));
        assert_eq!(Word::from_decimal(dec!(42.000)), Some(Word::from_u64(42)));
        assert_eq!(Word::from_decimal(dec!(1.5)), None);
        assert_eq!(Word::from_decimal(dec!(-1)), None);
    }

    #[test]
    fn test_word_too_large_for_decimal() {
        let word = Word::from_u128(u128::MAX);
        assert_eq!(word.to_decimal(), None);
        assert_eq!(word.to_u64(), None);
    }

    #[test]
    fn test_ascii_code_round_trip() {
        let word = Word::from_ascii_code("ARS").unwrap();
        assert_eq!(&word.as_bytes()[..3], b"ARS");
        assert_eq!(word.to_ascii_code().as_deref(), Some("ARS"));
        assert_eq!(Word::ZERO.to_ascii_code().as_deref(), Some(""));
    }

    #[test]
    fn test_ascii_code_rejects_garbage() {
        assert_eq!(Word::from_u64(1).to_ascii_code(), None);
        let mut bytes = [0u8; WORD_BYTES];
        bytes[0] = b'U';
        bytes[2] = b'D';
        assert_eq!(Word::from_bytes(bytes).to_ascii_code(), None);
    }

    #[test]
    fn test_address_parse_and_display() {
        let text = "0x00000000000000000000000000000000000000ff";
        let addr: Address = text.parse().unwrap();
        assert_eq!(addr.to_string(), text);
        assert!(matches!("0x1234".parse::<Address>(), Err(HexError::AddressLength(_))));
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr: Address = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1111111111111111111111111111111111111111\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
