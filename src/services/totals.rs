//! Invoice arithmetic: line-group sums, the two VAT bases, stamp duty and
//! the grand total, plus the editable draft those numbers are computed from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{InvoiceLines, InvoiceTotals, LineGroup, LineItem};
use crate::utils::{amount, format_amount, parse_amount, round_millimes};

/// VAT applied to transit fees.
pub fn transit_vat_rate() -> Decimal {
    Decimal::new(19, 2)
}

/// VAT applied to transport fees.
pub fn transport_vat_rate() -> Decimal {
    Decimal::new(7, 2)
}

pub fn default_stamp_duty() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    #[error("Amounts too large to compute the invoice totals")]
    Overflow,
}

fn sum(items: &[LineItem]) -> Result<Decimal, TotalsError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total.checked_add(item.amount).ok_or(TotalsError::Overflow)
    })
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, TotalsError> {
    a.checked_add(b).ok_or(TotalsError::Overflow)
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, TotalsError> {
    a.checked_mul(b).ok_or(TotalsError::Overflow)
}

/// Computes the totals block. Amounts keep full precision; rounding only
/// happens when rendering.
pub fn compute_totals(lines: &InvoiceLines, stamp_duty: Decimal) -> Result<InvoiceTotals, TotalsError> {
    let non_taxable = sum(&lines.disbursements)?;
    let transit = sum(&lines.transit)?;
    let transport = sum(&lines.transport)?;

    let vat_19 = mul(transit, transit_vat_rate())?;
    let vat_7 = mul(transport, transport_vat_rate())?;
    let taxable = add(transit, transport)?;

    let grand_total = [taxable, vat_19, vat_7, stamp_duty]
        .into_iter()
        .try_fold(non_taxable, add)?;

    Ok(InvoiceTotals {
        non_taxable,
        taxable,
        vat_7,
        vat_19,
        stamp_duty,
        grand_total,
    })
}

/// The "in your kind settlement" line: whole dinars and millimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountInWords {
    pub dinars: Decimal,
    pub millimes: Decimal,
}

impl AmountInWords {
    /// The remainder is rounded half-up to the millime; a remainder that
    /// rounds to 1000 carries into the dinars.
    pub fn from_total(total: Decimal) -> Self {
        let rounded = round_millimes(total);
        let whole = rounded.floor();
        let millimes = (rounded - whole) * Decimal::new(1000, 0);
        AmountInWords {
            dinars: whole.normalize(),
            millimes: millimes.normalize(),
        }
    }
}

impl fmt::Display for AmountInWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Dinars, {} millimes", self.dinars, self.millimes)
    }
}

/// Totals as shown on screen, next to the exact values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsView {
    pub totals: InvoiceTotals,
    pub non_taxable: String,
    pub taxable: String,
    pub vat_7: String,
    pub vat_19: String,
    pub stamp_duty: String,
    pub grand_total: String,
    pub in_words: String,
}

impl From<InvoiceTotals> for TotalsView {
    fn from(totals: InvoiceTotals) -> Self {
        TotalsView {
            non_taxable: format_amount(totals.non_taxable),
            taxable: format_amount(totals.taxable),
            vat_7: format_amount(totals.vat_7),
            vat_19: format_amount(totals.vat_19),
            stamp_duty: format_amount(totals.stamp_duty),
            grand_total: format_amount(totals.grand_total),
            in_words: AmountInWords::from_total(totals.grand_total).to_string(),
            totals,
        }
    }
}

/// Invoice being edited: line groups, stamp duty and the UC declaration
/// number typed on the invoice screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub lines: InvoiceLines,
    #[serde(with = "amount")]
    pub stamp_duty: Decimal,
    #[serde(default)]
    pub declaration_uc: String,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        InvoiceDraft {
            lines: default_lines(),
            stamp_duty: default_stamp_duty(),
            declaration_uc: String::new(),
        }
    }
}

impl InvoiceDraft {
    pub fn empty() -> Self {
        InvoiceDraft {
            lines: InvoiceLines::default(),
            stamp_duty: default_stamp_duty(),
            declaration_uc: String::new(),
        }
    }

    pub fn totals(&self) -> Result<InvoiceTotals, TotalsError> {
        compute_totals(&self.lines, self.stamp_duty)
    }

    pub fn add_row(&mut self, group: LineGroup) {
        self.lines
            .group_mut(group)
            .push(LineItem::new("Nouvelle ligne", Decimal::ZERO));
    }

    /// Out-of-range indexes are ignored.
    pub fn remove_row(&mut self, group: LineGroup, index: usize) {
        let rows = self.lines.group_mut(group);
        if index < rows.len() {
            rows.remove(index);
        }
    }

    pub fn set_label(&mut self, group: LineGroup, index: usize, label: &str) {
        if let Some(row) = self.lines.group_mut(group).get_mut(index) {
            row.label = label.to_string();
        }
    }

    pub fn set_amount(&mut self, group: LineGroup, index: usize, raw: &str) {
        if let Some(row) = self.lines.group_mut(group).get_mut(index) {
            row.amount = parse_amount(raw);
        }
    }

    pub fn set_stamp_duty(&mut self, raw: &str) {
        self.stamp_duty = parse_amount(raw);
    }
}

/// Line items pre-filled on a new invoice.
pub fn default_lines() -> InvoiceLines {
    let item = |label: &str, amount: i64, scale: u32| LineItem::new(label, Decimal::new(amount, scale));
    InvoiceLines {
        disbursements: vec![
            item("Droits & taxes C", 19, 0),
            item("Droits & taxes UC", 119, 0),
            item("Pénalité en douane (dépôt tardif)", 100, 0),
            item("Pénalité en douane (Enlèvement tardif)", 300, 0),
            item("Frais portuaire", 130, 0),
            item("Frais de visite du conteneur au port", 150, 0),
            item("Assurance", 62420, 3),
            item("Timbres douane", 25, 0),
        ],
        transit: vec![
            item("Honoraires", 250, 0),
            item("Formalité déclaration UC", 30, 0),
            item("Traitement informatique", 30, 0),
            item("Etablissement TCE", 20, 0),
            item("Etablissement bon de sortie", 25, 0),
            item("Frais fixes", 50, 0),
        ],
        transport: vec![item("Frais de transport d'un conteneur 20\"", 280, 0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        parse_amount(value)
    }

    fn lines(disbursements: &[&str], transit: &[&str], transport: &[&str]) -> InvoiceLines {
        let to_items = |values: &[&str]| {
            values
                .iter()
                .map(|v| LineItem::new("ligne", d(v)))
                .collect::<Vec<_>>()
        };
        InvoiceLines {
            disbursements: to_items(disbursements),
            transit: to_items(transit),
            transport: to_items(transport),
        }
    }

    #[test]
    fn grand_total_matches_formula() {
        let lines = lines(&["100", "25.5"], &["200"], &["50", "50"]);
        let totals = compute_totals(&lines, d("1")).unwrap();

        assert_eq!(totals.non_taxable, d("125.5"));
        assert_eq!(totals.taxable, d("300"));
        assert_eq!(totals.vat_19, d("38"));
        assert_eq!(totals.vat_7, d("7"));
        assert_eq!(totals.stamp_duty, d("1"));
        assert_eq!(totals.grand_total, d("471.5"));
    }

    #[test]
    fn empty_groups_and_zero_stamp_give_zero() {
        let totals = compute_totals(&InvoiceLines::default(), Decimal::ZERO).unwrap();
        assert_eq!(totals, InvoiceTotals::default());
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }

    #[test]
    fn recomputing_is_stable() {
        let draft = InvoiceDraft::default();
        assert_eq!(draft.totals().unwrap(), draft.totals().unwrap());
    }

    #[test]
    fn negative_amounts_propagate() {
        let lines = lines(&["-10"], &["-100"], &[]);
        let totals = compute_totals(&lines, Decimal::ZERO).unwrap();
        assert_eq!(totals.vat_19, d("-19"));
        assert_eq!(totals.grand_total, d("-129"));
    }

    #[test]
    fn default_template_total() {
        let totals = InvoiceDraft::default().totals().unwrap();
        assert_eq!(totals.non_taxable, d("905.42"));
        assert_eq!(totals.taxable, d("685"));
        assert_eq!(totals.vat_19, d("76.95"));
        assert_eq!(totals.vat_7, d("19.6"));
        assert_eq!(totals.grand_total, d("1687.97"));
    }

    #[test]
    fn amount_in_words_splits_dinars_and_millimes() {
        assert_eq!(
            AmountInWords::from_total(d("123.456")).to_string(),
            "123 Dinars, 456 millimes"
        );
        assert_eq!(
            AmountInWords::from_total(d("100.0005")),
            AmountInWords { dinars: d("100"), millimes: d("1") }
        );
        assert_eq!(
            AmountInWords::from_total(d("100.0004")),
            AmountInWords { dinars: d("100"), millimes: Decimal::ZERO }
        );
        assert_eq!(
            AmountInWords::from_total(d("41.9996")),
            AmountInWords { dinars: d("42"), millimes: Decimal::ZERO }
        );
    }

    #[test]
    fn draft_editing_coerces_bad_input() {
        let mut draft = InvoiceDraft::empty();
        draft.add_row(LineGroup::Transit);
        draft.set_amount(LineGroup::Transit, 0, "not a number");
        assert_eq!(draft.lines.transit[0].amount, Decimal::ZERO);
        assert_eq!(draft.lines.transit[0].label, "Nouvelle ligne");

        draft.set_amount(LineGroup::Transit, 0, "10,5");
        draft.set_label(LineGroup::Transit, 0, "Honoraires");
        draft.set_stamp_duty("abc");
        assert_eq!(draft.stamp_duty, Decimal::ZERO);
        assert_eq!(draft.totals().unwrap().grand_total, d("12.495"));

        draft.remove_row(LineGroup::Transit, 5);
        assert_eq!(draft.lines.transit.len(), 1);
        draft.remove_row(LineGroup::Transit, 0);
        assert!(draft.lines.transit.is_empty());
    }

    #[test]
    fn totals_view_renders_three_decimals() {
        let view = TotalsView::from(InvoiceDraft::default().totals().unwrap());
        assert_eq!(view.grand_total, "1687.970");
        assert_eq!(view.stamp_duty, "1.000");
        assert_eq!(view.in_words, "1687 Dinars, 970 millimes");
    }

    #[test]
    fn overflowing_amounts_are_an_error() {
        let max = Decimal::MAX.to_string();

        let group_sum = lines(&[max.as_str(), "1"], &[], &[]);
        assert_eq!(compute_totals(&group_sum, Decimal::ZERO), Err(TotalsError::Overflow));

        let with_vat = lines(&[], &[max.as_str()], &[]);
        assert_eq!(compute_totals(&with_vat, Decimal::ZERO), Err(TotalsError::Overflow));

        let with_stamp = lines(&[max.as_str()], &[], &[]);
        assert_eq!(compute_totals(&with_stamp, d("1")), Err(TotalsError::Overflow));
    }

    #[test]
    fn amount_in_words_covers_totals_beyond_i64() {
        let words = AmountInWords::from_total(d("98765432109876543210.5"));
        assert_eq!(words.to_string(), "98765432109876543210 Dinars, 500 millimes");
    }
}
