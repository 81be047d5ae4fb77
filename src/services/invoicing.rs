use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::db::Database;
use crate::models::{BillingParty, CaseFile, InvoiceRoute};
use crate::services::billing::{billing_party, build_invoice_document, draft_from_document, match_client};
use crate::services::error::ServiceError;
use crate::services::numbering::year_suffix;
use crate::services::totals::{InvoiceDraft, TotalsView};
use crate::utils::now_rfc3339;

/// Everything the invoice screen shows for one case file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceEditor {
    pub case_file: CaseFile,
    pub billing: BillingParty,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub issued_on: Option<String>,
    pub draft: InvoiceDraft,
    pub totals: TotalsView,
    pub route: InvoiceRoute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedInvoice {
    pub id: i64,
    pub number: String,
    pub created: bool,
    pub totals: TotalsView,
}

fn lock(db: &Arc<Mutex<Database>>) -> Result<std::sync::MutexGuard<'_, Database>, ServiceError> {
    db.lock().map_err(|_| ServiceError::Lock("Database"))
}

/// Loads a case file's invoice for editing, or a pre-filled draft when it
/// has none yet.
pub fn open_invoice(db: &Arc<Mutex<Database>>, case_number: &str) -> Result<InvoiceEditor, ServiceError> {
    let db = lock(db)?;
    let case_file = db
        .get_case_file(case_number)?
        .ok_or_else(|| ServiceError::NotFound(format!("Case file {}", case_number)))?;
    let clients = db.list_clients()?;
    let client = match_client(&clients, case_file.billing_name());
    let billing = billing_party(&case_file, client);
    let invoice = db.get_invoice_for_case(case_number)?;

    let draft = invoice
        .as_ref()
        .map(|record| draft_from_document(&record.document))
        .unwrap_or_default();
    let totals = TotalsView::from(draft.totals()?);

    Ok(InvoiceEditor {
        billing,
        invoice_id: invoice.as_ref().map(|record| record.id),
        invoice_number: invoice.as_ref().map(|record| record.number.clone()),
        issued_on: invoice.as_ref().map(|record| record.document.header.date.clone()),
        totals,
        route: InvoiceRoute::for_case(invoice.is_some()),
        draft,
        case_file,
    })
}

/// Saves the draft as the case file's invoice and records the amount on
/// its payment row.
///
/// The first validation allocates the next number of `today`'s year. Later
/// validations keep the number and the issue date and rewrite the rest.
pub fn validate_invoice(
    db: &Arc<Mutex<Database>>,
    case_number: &str,
    draft: &InvoiceDraft,
    today: NaiveDate,
) -> Result<SavedInvoice, ServiceError> {
    let mut db = lock(db)?;
    let case_file = db
        .get_case_file(case_number)?
        .ok_or_else(|| ServiceError::NotFound(format!("Case file {}", case_number)))?;
    let clients = db.list_clients()?;
    let client = match_client(&clients, case_file.billing_name());
    if client.is_none() {
        tracing::warn!(
            case_number,
            billing_name = case_file.billing_name(),
            "No client matches the billing name, billing fields left empty"
        );
    }

    let totals = draft.totals()?;
    let saved = match db.get_invoice_for_case(case_number)? {
        Some(existing) => {
            let mut document = build_invoice_document(&existing.number, &case_file, client, draft, totals, today);
            document.header.date = existing.document.header.date.clone();
            document.header.modified_at = Some(now_rfc3339());
            db.update_invoice(existing.id, &document)?;
            SavedInvoice {
                id: existing.id,
                number: existing.number,
                created: false,
                totals: TotalsView::from(totals),
            }
        }
        None => {
            let record = db.insert_invoice_with_next_number(case_number, year_suffix(today), |number| {
                build_invoice_document(number, &case_file, client, draft, totals, today)
            })?;
            SavedInvoice {
                id: record.id,
                number: record.number,
                created: true,
                totals: TotalsView::from(totals),
            }
        }
    };

    db.record_payment_amount(case_number, totals.grand_total)?;

    tracing::info!(
        case_number,
        invoice_id = saved.id,
        invoice_number = %saved.number,
        created = saved.created,
        grand_total = %totals.grand_total,
        "Invoice saved"
    );

    Ok(saved)
}
