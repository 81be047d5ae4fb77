use chrono::NaiveDate;

use crate::models::{BillingParty, CaseFile, Client, InvoiceDocument, InvoiceHeader, InvoiceTotals};
use crate::services::totals::InvoiceDraft;
use crate::utils::format_invoice_date;

/// Finds the directory entry for a billing name: exact name first (trimmed,
/// case-insensitive), then the first client whose name contains it.
pub fn match_client<'a>(clients: &'a [Client], name: &str) -> Option<&'a Client> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    clients
        .iter()
        .find(|client| client.name.trim().to_lowercase() == needle)
        .or_else(|| {
            clients
                .iter()
                .find(|client| client.name.to_lowercase().contains(&needle))
        })
}

pub fn billing_party(case_file: &CaseFile, client: Option<&Client>) -> BillingParty {
    BillingParty {
        client_code: client.map(|c| c.code.clone()).unwrap_or_default(),
        name: case_file.billing_name().to_string(),
        address: client.map(|c| c.address.clone()).unwrap_or_default(),
        vat_code: client.map(|c| c.vat_code.clone()).unwrap_or_default(),
    }
}

/// Splits `ctu_lta` into container and mark around the first `"`.
pub fn split_container_ref(container_ref: &str) -> (String, String) {
    match container_ref.split_once('"') {
        Some((container, mark)) => (container.to_string(), mark.to_string()),
        None => (container_ref.to_string(), String::new()),
    }
}

/// `"<number> du <date>"`, or empty unless both parts are known.
pub fn customs_declaration(case_file: &CaseFile) -> String {
    let number = case_file.declaration_number.trim();
    let date = case_file.declaration_date.trim();
    if number.is_empty() || date.is_empty() {
        return String::new();
    }
    format!("{} du {}", number, date)
}

pub fn invoice_header(
    number: &str,
    case_file: &CaseFile,
    draft: &InvoiceDraft,
    issued_on: NaiveDate,
) -> InvoiceHeader {
    let (container, mark) = split_container_ref(&case_file.container_ref);
    InvoiceHeader {
        number: number.to_string(),
        date: format_invoice_date(issued_on),
        case_number: case_file.case_number.clone(),
        direction: case_file.direction.to_string(),
        vessel: case_file.vessel.clone(),
        movement_date: case_file.movement_date().to_string(),
        container,
        mark,
        customs_declaration: customs_declaration(case_file),
        declaration_uc: draft.declaration_uc.clone(),
        port_call: case_file.port_call.clone(),
        heading: case_file.heading.clone(),
        packaging: case_file.packaging.clone(),
        gross_weight: case_file.gross_weight.clone(),
        customs_value: case_file.customs_value.clone(),
        modified_at: None,
    }
}

pub fn build_invoice_document(
    number: &str,
    case_file: &CaseFile,
    client: Option<&Client>,
    draft: &InvoiceDraft,
    totals: InvoiceTotals,
    issued_on: NaiveDate,
) -> InvoiceDocument {
    InvoiceDocument {
        header: invoice_header(number, case_file, draft, issued_on),
        client: billing_party(case_file, client),
        lines: draft.lines.clone(),
        totals,
    }
}

/// Reopens a stored invoice for editing.
pub fn draft_from_document(document: &InvoiceDocument) -> InvoiceDraft {
    InvoiceDraft {
        lines: document.lines.clone(),
        stamp_duty: document.totals.stamp_duty,
        declaration_uc: document.header.declaration_uc.clone(),
    }
}
