use crate::core::loan::{Loan, LoanStatus};
use crate::core::word::{Address, Word, WORD_BYTES};
use crate::error::{EngineError, Result};
use log::{debug, warn};

/// Number of words in one loan record.
pub const RECORD_WORDS: usize = 20;

/// Word offsets inside a loan record.
pub mod offset {
    pub const STATUS: usize = 0;
    pub const ORACLE: usize = 1;
    pub const BORROWER: usize = 2;
    pub const LENDER: usize = 3;
    pub const CREATOR: usize = 4;
    pub const COSIGNER: usize = 5;
    pub const AMOUNT: usize = 6;
    pub const INTEREST: usize = 7;
    pub const PUNITORY_INTEREST: usize = 8;
    pub const INTEREST_TIMESTAMP: usize = 9;
    pub const PAID: usize = 10;
    pub const INTEREST_RATE: usize = 11;
    pub const INTEREST_RATE_PUNITORY: usize = 12;
    pub const DUE_TIME: usize = 13;
    pub const DUES_IN: usize = 14;
    pub const CURRENCY: usize = 15;
    pub const CANCELABLE_AT: usize = 16;
    pub const LENDER_BALANCE: usize = 17;
    pub const EXPIRATION_REQUESTS: usize = 18;
    pub const ID: usize = 19;
}

fn read_u64(record: &[Word], index: usize, field: &str) -> Result<u64> {
    record[index].to_u64().ok_or_else(|| {
        EngineError::malformed(format!("{} word {} does not fit 64 bits", field, record[index]))
    })
}

fn read_amount(record: &[Word], index: usize, field: &str) -> Result<rust_decimal::Decimal> {
    record[index].to_decimal().ok_or_else(|| {
        EngineError::malformed(format!("{} word {} exceeds the decimal range", field, record[index]))
    })
}

/// Decode one 20-word loan record.
///
/// The `id` is supplied by the caller: single-loan fetches know it up
/// front, batch decoding reads it from the record itself.
pub fn decode_loan(engine: Address, id: u64, record: &[Word]) -> Result<Loan> {
    if record.len() != RECORD_WORDS {
        return Err(EngineError::malformed(format!(
            "expected {} words per loan, got {}",
            RECORD_WORDS,
            record.len()
        )));
    }

    let currency = record[offset::CURRENCY];
    let currency_raw = currency.to_ascii_code().unwrap_or_else(|| {
        warn!("Loan {} has a non-ASCII currency word {}", id, currency);
        String::new()
    });
    Ok(Loan {
        id,
        engine,
        status: LoanStatus::from_code(read_u64(record, offset::STATUS, "status")?),
        oracle: record[offset::ORACLE].to_address(),
        borrower: record[offset::BORROWER].to_address(),
        lender: record[offset::LENDER].to_address(),
        creator: record[offset::CREATOR].to_address(),
        cosigner: record[offset::COSIGNER].to_address(),
        raw_amount: read_amount(record, offset::AMOUNT, "amount")?,
        interest: read_amount(record, offset::INTEREST, "interest")?,
        punitory_interest: read_amount(record, offset::PUNITORY_INTEREST, "punitory interest")?,
        interest_timestamp: read_u64(record, offset::INTEREST_TIMESTAMP, "interest timestamp")?,
        paid: read_amount(record, offset::PAID, "paid")?,
        interest_rate: read_u64(record, offset::INTEREST_RATE, "interest rate")?,
        interest_rate_punitory: read_u64(
            record,
            offset::INTEREST_RATE_PUNITORY,
            "punitory interest rate",
        )?,
        due_time: read_u64(record, offset::DUE_TIME, "due time")?,
        dues_in: read_u64(record, offset::DUES_IN, "dues in")?,
        currency,
        currency_raw,
        cancelable_at: read_u64(record, offset::CANCELABLE_AT, "cancelable at")?,
        lender_balance: read_amount(record, offset::LENDER_BALANCE, "lender balance")?,
        expiration_requests: read_u64(
            record,
            offset::EXPIRATION_REQUESTS,
            "expiration requests",
        )?,
    })
}

/// Decode a concatenation of loan records.
///
/// Fails as a whole when the word count is not a multiple of
/// [`RECORD_WORDS`]: a misaligned boundary shifts every later offset.
pub fn decode_loan_batch(engine: Address, words: &[Word]) -> Result<Vec<Loan>> {
    if words.len() % RECORD_WORDS != 0 {
        return Err(EngineError::malformed(format!(
            "batch of {} words is not a multiple of {}",
            words.len(),
            RECORD_WORDS
        )));
    }

    let loans = words
        .chunks_exact(RECORD_WORDS)
        .map(|chunk| {
            let id = read_u64(chunk, offset::ID, "id")?;
            decode_loan(engine, id, chunk)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Decoded {} loans from {} words", loans.len(), words.len());
    Ok(loans)
}

/// Split a raw byte blob into ledger words.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<Word>> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(EngineError::malformed(format!(
            "blob of {} bytes is not a multiple of {}",
            bytes.len(),
            WORD_BYTES
        )));
    }
    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| {
            let mut word = [0u8; WORD_BYTES];
            word.copy_from_slice(chunk);
            Word::from_bytes(word)
        })
        .collect())
}

/// Left-pad an address to a full ledger word.
pub fn encode_address_as_word(address: Address) -> Word {
    let mut bytes = [0u8; WORD_BYTES];
    bytes[WORD_BYTES - address.as_bytes().len()..].copy_from_slice(address.as_bytes());
    Word::from_bytes(bytes)
}

fn amount_word(value: rust_decimal::Decimal, field: &str) -> Result<Word> {
    Word::from_decimal(value).ok_or_else(|| {
        EngineError::malformed(format!("{} {} is not a non-negative integer", field, value))
    })
}

/// Encode a loan back into its 20-word record.
///
/// Inverse of [`decode_loan`] for records whose address words carry no
/// bytes above the low 20.
pub fn encode_loan(loan: &Loan) -> Result<Vec<Word>> {
    let mut record = vec![Word::ZERO; RECORD_WORDS];
    record[offset::STATUS] = Word::from_u64(loan.status.code());
    record[offset::ORACLE] = encode_address_as_word(loan.oracle);
    record[offset::BORROWER] = encode_address_as_word(loan.borrower);
    record[offset::LENDER] = encode_address_as_word(loan.lender);
    record[offset::CREATOR] = encode_address_as_word(loan.creator);
    record[offset::COSIGNER] = encode_address_as_word(loan.cosigner);
    record[offset::AMOUNT] = amount_word(loan.raw_amount, "amount")?;
    record[offset::INTEREST] = amount_word(loan.interest, "interest")?;
    record[offset::PUNITORY_INTEREST] = amount_word(loan.punitory_interest, "punitory interest")?;
    record[offset::INTEREST_TIMESTAMP] = Word::from_u64(loan.interest_timestamp);
    record[offset::PAID] = amount_word(loan.paid, "paid")?;
    record[offset::INTEREST_RATE] = Word::from_u64(loan.interest_rate);
    record[offset::INTEREST_RATE_PUNITORY] = Word::from_u64(loan.interest_rate_punitory);
    record[offset::DUE_TIME] = Word::from_u64(loan.due_time);
    record[offset::DUES_IN] = Word::from_u64(loan.dues_in);
    record[offset::CURRENCY] = loan.currency;
    record[offset::CANCELABLE_AT] = Word::from_u64(loan.cancelable_at);
    record[offset::LENDER_BALANCE] = amount_word(loan.lender_balance, "lender balance")?;
    record[offset::EXPIRATION_REQUESTS] = Word::from_u64(loan.expiration_requests);
    record[offset::ID] = Word::from_u64(loan.id);
    Ok(record)
}
