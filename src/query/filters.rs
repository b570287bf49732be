use crate::codec::record::encode_address_as_word;
use crate::core::word::{Address, Word};
use crate::remote::CallArg;
use serde::{Deserialize, Serialize};

/// Filter contracts and their positional parameters for a bulk query.
///
/// The ledger pairs `filters` and `params` by its own positional
/// convention, so both lists are kept exactly as constructed. The two
/// lists need not have the same length.
///
/// # Examples
///
/// ```
/// use loan_query_engine::core::word::Address;
/// use loan_query_engine::query::filters::QueryFilterSpec;
///
/// let lender_in: Address = "0x2000000000000000000000000000000000000005".parse().unwrap();
/// let lender: Address = "0x3000000000000000000000000000000000000001".parse().unwrap();
///
/// let spec = QueryFilterSpec::by_lender(lender_in, lender);
/// assert_eq!(spec.filters(), &[lender_in]);
/// assert_eq!(spec.params().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryFilterSpec {
    filters: Vec<Address>,
    params: Vec<Word>,
}

impl QueryFilterSpec {
    pub fn new(filters: Vec<Address>, params: Vec<Word>) -> Self {
        Self { filters, params }
    }

    /// Loans currently being repaid.
    pub fn active(ongoing: Address, mortgage_creator: Address) -> Self {
        Self::new(vec![ongoing], mortgage_params(mortgage_creator))
    }

    /// Open, non-expired requests backed by a valid mortgage.
    pub fn open(
        open_loans: Address,
        non_expired: Address,
        valid_mortgage: Address,
        mortgage_creator: Address,
    ) -> Self {
        Self::new(
            vec![open_loans, non_expired, valid_mortgage],
            mortgage_params(mortgage_creator),
        )
    }

    /// Loans whose lender is `lender`.
    pub fn by_lender(lender_in: Address, lender: Address) -> Self {
        Self::new(vec![lender_in], vec![encode_address_as_word(lender)])
    }

    pub fn filters(&self) -> &[Address] {
        &self.filters
    }

    pub fn params(&self) -> &[Word] {
        &self.params
    }

    /// Arguments of `queryLoans(engine, 0, 0, filters, params)`.
    ///
    /// The 0..0 range means "no explicit paging bounds" and is passed on
    /// verbatim; paging belongs to the ledger.
    pub fn to_call_args(&self, engine: Address) -> Vec<CallArg> {
        vec![
            CallArg::Address(engine),
            CallArg::uint(0),
            CallArg::uint(0),
            CallArg::AddressList(self.filters.clone()),
            CallArg::WordList(self.params.clone()),
        ]
    }
}

fn mortgage_params(mortgage_creator: Address) -> Vec<Word> {
    vec![Word::ZERO, Word::ZERO, encode_address_as_word(mortgage_creator)]
}
