use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "montant", with = "amount", default)]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        LineItem {
            label: label.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineGroup {
    /// Non-taxable disbursements (débours).
    Disbursements,
    /// Transit fees, taxed at 19%.
    Transit,
    /// Transport fees, taxed at 7%.
    Transport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLines {
    #[serde(rename = "debours", default)]
    pub disbursements: Vec<LineItem>,
    #[serde(default)]
    pub transit: Vec<LineItem>,
    #[serde(default)]
    pub transport: Vec<LineItem>,
}

impl InvoiceLines {
    pub fn group_mut(&mut self, group: LineGroup) -> &mut Vec<LineItem> {
        match group {
            LineGroup::Disbursements => &mut self.disbursements,
            LineGroup::Transit => &mut self.transit,
            LineGroup::Transport => &mut self.transport,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    #[serde(rename = "total_non_taxable", with = "amount", default)]
    pub non_taxable: Decimal,
    #[serde(rename = "total_taxable", with = "amount", default)]
    pub taxable: Decimal,
    #[serde(rename = "tva_7", with = "amount", default)]
    pub vat_7: Decimal,
    #[serde(rename = "tva_19", with = "amount", default)]
    pub vat_19: Decimal,
    #[serde(rename = "timbre", with = "amount", default)]
    pub stamp_duty: Decimal,
    #[serde(rename = "total_final", with = "amount", default)]
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "dossier_no", default)]
    pub case_number: String,
    #[serde(rename = "mode", default)]
    pub direction: String,
    #[serde(rename = "navire", default)]
    pub vessel: String,
    #[serde(rename = "date_arrivee", default)]
    pub movement_date: String,
    #[serde(rename = "conteneur", default)]
    pub container: String,
    #[serde(rename = "marque", default)]
    pub mark: String,
    #[serde(rename = "declaration_c", default)]
    pub customs_declaration: String,
    #[serde(default)]
    pub declaration_uc: String,
    #[serde(rename = "escale", default)]
    pub port_call: String,
    #[serde(rename = "rubrique", default)]
    pub heading: String,
    #[serde(rename = "colisage", default)]
    pub packaging: String,
    #[serde(rename = "poids_brut", default)]
    pub gross_weight: String,
    #[serde(rename = "valeur_douane", default)]
    pub customs_value: String,
    #[serde(rename = "date_modification", default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Billing block of an invoice. Empty fields when no client matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingParty {
    #[serde(rename = "code_client", default)]
    pub client_code: String,
    #[serde(rename = "nom", default)]
    pub name: String,
    #[serde(rename = "adresse", default)]
    pub address: String,
    #[serde(rename = "code_tva", default)]
    pub vat_code: String,
}

/// The persisted invoice snapshot read by the document service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    #[serde(rename = "facture")]
    pub header: InvoiceHeader,
    #[serde(default)]
    pub client: BillingParty,
    #[serde(rename = "lignes", default)]
    pub lines: InvoiceLines,
    #[serde(rename = "totaux", default)]
    pub totals: InvoiceTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: i64,
    #[serde(rename = "dossier_no")]
    pub case_number: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "montant_total")]
    pub grand_total: Decimal,
    #[serde(rename = "data_json")]
    pub document: InvoiceDocument,
    pub created_at: String,
    pub updated_at: String,
}
