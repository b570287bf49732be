pub mod loan;
pub mod word;
