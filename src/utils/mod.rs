use chrono::{NaiveDate, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fixed-width UTC timestamp, so stored values sort lexicographically.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Invoice date as printed on the document (`dd/mm/yyyy`).
pub fn format_invoice_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parses user-entered amounts. Anything that is not a number counts as zero.
pub fn parse_amount(value: &str) -> Decimal {
    let raw = value.trim().replace(',', ".");
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .unwrap_or(Decimal::ZERO)
}

pub fn round_millimes(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_amount(value: Decimal) -> String {
    format!("{:.3}", round_millimes(value))
}

/// Replaces path separators so a case number can be used in a file name.
pub fn safe_file_stem(value: &str) -> String {
    value.trim().replace(['/', '\\'], "_")
}

/// Serde adapter for amounts: written as exact JSON numbers, read leniently
/// from numbers or strings.
pub mod amount {
    use rust_decimal::Decimal;
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Number, Value};
    use std::str::FromStr;

    /// Writes the exact decimal digits as a JSON number.
    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Number::from_str(&value.to_string())
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::Number(number) => super::parse_amount(&number.to_string()),
            Value::String(text) => super::parse_amount(&text),
            _ => Decimal::ZERO,
        })
    }
}
