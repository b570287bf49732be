pub mod oracle;
pub mod rate;
pub mod withdrawal;
