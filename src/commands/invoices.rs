use chrono::Local;

use crate::commands::user_error;
use crate::services::documents::{invoice_pdf_name, open_document, save_pdf};
use crate::services::invoicing::{self, InvoiceEditor, SavedInvoice};
use crate::services::state::AppState;
use crate::services::totals::{InvoiceDraft, TotalsView};

pub async fn open_invoice(case_number: String, state: &AppState) -> Result<InvoiceEditor, String> {
    invoicing::open_invoice(&state.db, &case_number).map_err(|e| user_error("open_invoice", e))
}

/// Totals for a draft being edited. Nothing is stored.
pub async fn compute_invoice_totals(draft: InvoiceDraft) -> Result<TotalsView, String> {
    draft
        .totals()
        .map(TotalsView::from)
        .map_err(|e| user_error("compute_invoice_totals", e))
}

pub async fn validate_invoice(
    case_number: String,
    draft: InvoiceDraft,
    state: &AppState,
) -> Result<SavedInvoice, String> {
    let today = Local::now().date_naive();
    invoicing::validate_invoice(&state.db, &case_number, &draft, today)
        .map_err(|e| user_error("validate_invoice", e))
}

/// Downloads the rendered invoice of a case file into the download folder.
pub async fn download_invoice_pdf(case_number: String, state: &AppState) -> Result<String, String> {
    let (invoice_id, invoice_number) = {
        let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
        db.get_invoice_for_case(&case_number)
            .map_err(|e| user_error("download_invoice_pdf", e))?
            .map(|record| (record.id, record.number))
            .ok_or_else(|| "Invoice not saved yet".to_string())?
    };

    let client = state
        .document_client()
        .map_err(|e| user_error("download_invoice_pdf", e))?;
    let folder = state
        .download_folder()
        .map_err(|e| user_error("download_invoice_pdf", e))?;

    let bytes = client
        .fetch_invoice_pdf(invoice_id)
        .await
        .map_err(|e| user_error("download_invoice_pdf", e))?;
    let path = save_pdf(&folder, &invoice_pdf_name(&invoice_number, invoice_id), &bytes)
        .await
        .map_err(|e| user_error("download_invoice_pdf", e))?;

    tracing::info!(%case_number, invoice_id, %invoice_number, path = %path.display(), "Invoice PDF saved");
    Ok(path.to_string_lossy().to_string())
}

pub async fn open_document_file(path: String) -> Result<(), String> {
    open_document(std::path::Path::new(&path)).map_err(|e| user_error("open_document_file", e))
}
