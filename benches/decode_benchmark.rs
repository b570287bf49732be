use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loan_query_engine::codec::record::{decode_loan_batch, offset, RECORD_WORDS};
use loan_query_engine::config::CurationRules;
use loan_query_engine::core::word::{Address, Word};
use loan_query_engine::query::curation::curate_loans;
use loan_query_engine::valuation::withdrawal::compute_pending_withdrawal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CURRENCIES: [&str; 4] = ["", "ARS", "USD", "EUR"];

/// Random but well-formed query result of `count` records.
fn generate_query_result(count: usize, seed: u64) -> Vec<Word> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut words = Vec::with_capacity(count * RECORD_WORDS);

    for id in 0..count {
        let mut record = vec![Word::ZERO; RECORD_WORDS];
        record[offset::STATUS] = Word::from_u64(rng.gen_range(0..5));
        for field in [
            offset::ORACLE,
            offset::BORROWER,
            offset::LENDER,
            offset::CREATOR,
        ] {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes[12..]);
            record[field] = Word::from_bytes(bytes);
        }
        record[offset::AMOUNT] = Word::from_u128(rng.gen_range(1..1_000_000_000_000_000_000_000));
        record[offset::INTEREST_RATE] = Word::from_u64(rng.gen_range(0..100_000_000_000_000));
        record[offset::INTEREST_RATE_PUNITORY] =
            Word::from_u64(rng.gen_range(0..100_000_000_000_000));
        record[offset::CURRENCY] = Word::from_ascii_code(CURRENCIES[rng.gen_range(0..CURRENCIES.len())])
            .unwrap_or(Word::ZERO);
        if rng.gen_bool(0.3) {
            record[offset::LENDER_BALANCE] = Word::from_u128(rng.gen_range(1..1_000_000_000_000_000_000));
        }
        record[offset::EXPIRATION_REQUESTS] = Word::from_u64(rng.gen_range(1_600_000_000..1_900_000_000));
        record[offset::ID] = Word::from_u64(id as u64);
        words.extend(record);
    }
    words
}

fn bench_decode_100_loans(c: &mut Criterion) {
    let words = generate_query_result(100, 42);

    c.bench_function("decode_100_loans", |b| {
        b.iter(|| decode_loan_batch(Address::ZERO, black_box(&words)))
    });
}

fn bench_decode_10000_loans(c: &mut Criterion) {
    let words = generate_query_result(10_000, 42);

    c.bench_function("decode_10000_loans", |b| {
        b.iter(|| decode_loan_batch(Address::ZERO, black_box(&words)))
    });
}

fn bench_curate_and_aggregate_10000_loans(c: &mut Criterion) {
    let words = generate_query_result(10_000, 7);
    let rules = CurationRules::default();

    c.bench_function("curate_and_aggregate_10000_loans", |b| {
        b.iter(|| {
            let loans = decode_loan_batch(Address::ZERO, black_box(&words)).unwrap_or_default();
            let curated = curate_loans(loans, &rules);
            compute_pending_withdrawal(&curated).ok()
        })
    });
}

criterion_group!(
    benches,
    bench_decode_100_loans,
    bench_decode_10000_loans,
    bench_curate_and_aggregate_10000_loans
);
criterion_main!(benches);
