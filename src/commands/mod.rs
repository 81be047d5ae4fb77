//! Operations invoked by the desktop shell, one per user action. Failures
//! are logged and handed back as the message to show the user.

pub mod archive;
pub mod case_files;
pub mod clients;
pub mod dashboard;
pub mod invoices;
pub mod settings;

use std::fmt::Display;

fn user_error(action: &'static str, err: impl Display) -> String {
    let message = err.to_string();
    tracing::error!(action, error = %message, "Command failed");
    message
}
