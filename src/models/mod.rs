use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod invoice;

pub use invoice::{
    BillingParty, InvoiceDocument, InvoiceHeader, InvoiceLines, InvoiceRecord, InvoiceTotals,
    LineGroup, LineItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Import,
    Export,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Import => "import",
            Direction::Export => "export",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(Direction::Import),
            "export" => Ok(Direction::Export),
            other => Err(format!("Unknown direction: {}", other)),
        }
    }
}

/// A customs / transit case file. Field names on the wire follow the
/// document service's form payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(rename = "dossier_no")]
    pub case_number: String,
    #[serde(rename = "mode", default)]
    pub direction: Direction,
    #[serde(rename = "expediteur", default)]
    pub sender: String,
    #[serde(rename = "destinataire", default)]
    pub recipient: String,
    #[serde(rename = "marchandise", default)]
    pub goods: String,
    #[serde(rename = "nature_chargement", default = "default_load_type")]
    pub load_type: String,
    #[serde(rename = "agent_marit", default)]
    pub shipping_agent: String,
    #[serde(rename = "magasin", default)]
    pub warehouse: String,
    #[serde(rename = "port_emb", default)]
    pub loading_port: String,
    #[serde(rename = "date_emb", default)]
    pub loading_date: String,
    #[serde(rename = "port_dest", default)]
    pub destination_port: String,
    #[serde(rename = "date_dest", default)]
    pub arrival_date: String,
    #[serde(rename = "ctu_lta", default)]
    pub container_ref: String,
    #[serde(rename = "navire", default)]
    pub vessel: String,
    #[serde(rename = "escale", default)]
    pub port_call: String,
    #[serde(rename = "rubrique", default)]
    pub heading: String,
    #[serde(rename = "colisage", default)]
    pub packaging: String,
    #[serde(rename = "pb", default)]
    pub gross_weight: String,
    #[serde(rename = "valeur_devise", default)]
    pub foreign_value: String,
    #[serde(rename = "valeur_dinars", default)]
    pub customs_value: String,
    #[serde(default)]
    pub dg: String,
    #[serde(rename = "type_declaration", default)]
    pub declaration_type: String,
    #[serde(rename = "declaration_no", default)]
    pub declaration_number: String,
    #[serde(rename = "date_declaration", default)]
    pub declaration_date: String,
    #[serde(rename = "repertoire", default)]
    pub register: String,
    #[serde(rename = "banque", default)]
    pub bank: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_load_type() -> String {
    "Complet".to_string()
}

impl CaseFile {
    pub fn new(case_number: impl Into<String>, direction: Direction) -> Self {
        CaseFile {
            case_number: case_number.into(),
            direction,
            load_type: default_load_type(),
            ..Default::default()
        }
    }

    /// Name of the party billed for this case: the recipient on imports, the
    /// sender on exports.
    pub fn billing_name(&self) -> &str {
        match self.direction {
            Direction::Import => &self.recipient,
            Direction::Export => &self.sender,
        }
    }

    /// Arrival date on imports, loading date on exports.
    pub fn movement_date(&self) -> &str {
        match self.direction {
            Direction::Import => &self.arrival_date,
            Direction::Export => &self.loading_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(rename = "code_client")]
    pub code: String,
    #[serde(rename = "nom_client")]
    pub name: String,
    #[serde(rename = "adresse")]
    pub address: String,
    #[serde(rename = "code_tva")]
    pub vat_code: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPayload {
    #[serde(rename = "code_client", default)]
    pub code: String,
    #[serde(rename = "nom_client")]
    pub name: String,
    #[serde(rename = "adresse", default)]
    pub address: String,
    #[serde(rename = "code_tva", default)]
    pub vat_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(rename = "dossier_no")]
    pub case_number: String,
    #[serde(rename = "paye")]
    pub paid: bool,
    #[serde(rename = "montant")]
    pub amount: Option<Decimal>,
    #[serde(rename = "date_creation")]
    pub created_at: String,
    #[serde(rename = "date_maj")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    /// A case without a payment row is unpaid.
    pub fn from_payment(payment: Option<&Payment>) -> Self {
        match payment {
            Some(payment) if payment.paid => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// Which invoice screen a case file opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceRoute {
    Create,
    Edit,
}

impl InvoiceRoute {
    pub fn for_case(has_invoice: bool) -> Self {
        if has_invoice {
            InvoiceRoute::Edit
        } else {
            InvoiceRoute::Create
        }
    }
}

/// A case file joined with its first invoice and its payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFileOverview {
    pub case_file: CaseFile,
    pub has_invoice: bool,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub invoice_amount: Decimal,
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub case_number: String,
    pub direction: Direction,
    pub recipient: String,
    pub sender: String,
    pub created_at: Option<String>,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub invoice_amount: Decimal,
    pub status: PaymentStatus,
    pub route: InvoiceRoute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl StatusFilter {
    pub fn matches(&self, status: PaymentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status == PaymentStatus::Paid,
            StatusFilter::Unpaid => status == PaymentStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBalance {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnpaidSummary {
    pub total: Decimal,
    pub by_client: BTreeMap<String, ClientBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveView {
    pub unpaid: Vec<ArchiveEntry>,
    pub paid: Vec<ArchiveEntry>,
    pub unpaid_summary: UnpaidSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub document_service_url: String,
    pub download_folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCaseCount {
    pub month: String,
    pub total: usize,
    pub imports: usize,
    pub exports: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub year: i32,
    pub total_case_files: usize,
    pub imports: usize,
    pub exports: usize,
    pub invoiced_total: Decimal,
    pub monthly: Vec<MonthlyCaseCount>,
}
