//! Sequential invoice numbers, `NNN/YY`, restarting every calendar year.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumberingError {
    #[error("Malformed invoice number: {0:?}")]
    Malformed(String),
    #[error("Invoice sequence overflow after {0:?}")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceNumber {
    pub sequence: u32,
    pub year: u8,
}

impl InvoiceNumber {
    pub fn first_of(year: u8) -> Self {
        InvoiceNumber { sequence: 1, year }
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}/{:02}", self.sequence, self.year)
    }
}

impl FromStr for InvoiceNumber {
    type Err = NumberingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || NumberingError::Malformed(value.to_string());
        let (sequence, year) = value.split_once('/').ok_or_else(malformed)?;

        if sequence.len() < 3 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        Ok(InvoiceNumber {
            sequence: sequence.parse().map_err(|_| malformed())?,
            year: year.parse().map_err(|_| malformed())?,
        })
    }
}

/// Two-digit year used as the number suffix.
pub fn year_suffix(date: NaiveDate) -> u8 {
    date.year().rem_euclid(100) as u8
}

/// Next number for `year`, given existing numbers newest first.
///
/// Only the most recent number carrying the year's suffix is looked at. A
/// malformed one is an error rather than a gap in the sequence.
pub fn next_invoice_number<'a, I>(newest_first: I, year: u8) -> Result<InvoiceNumber, NumberingError>
where
    I: IntoIterator<Item = &'a str>,
{
    let suffix = format!("/{:02}", year);
    let latest = newest_first
        .into_iter()
        .find(|number| number.ends_with(&suffix));

    let Some(latest) = latest else {
        return Ok(InvoiceNumber::first_of(year));
    };

    let parsed: InvoiceNumber = latest.parse()?;
    let sequence = parsed
        .sequence
        .checked_add(1)
        .ok_or_else(|| NumberingError::Overflow(latest.to_string()))?;

    Ok(InvoiceNumber { sequence, year })
}
