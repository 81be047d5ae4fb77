pub mod billing;
pub mod documents;
pub mod error;
pub mod invoicing;
pub mod numbering;
pub mod state;
pub mod totals;
