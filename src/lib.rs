//! Back office for a freight forwarder: customs case files, client
//! directory, payment follow-up and invoices.

pub mod commands;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

pub use db::Database;
pub use services::state::AppState;
