use crate::commands::user_error;
use crate::models::{CaseFile, PaymentStatus};
use crate::services::documents::{case_file_pdf_name, save_pdf};
use crate::services::state::AppState;

pub async fn create_case_file(payload: CaseFile, state: &AppState) -> Result<CaseFile, String> {
    let case_number = payload.case_number.trim();
    if case_number.is_empty() {
        return Err("A case number is required".to_string());
    }

    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    if db
        .get_case_file(case_number)
        .map_err(|e| user_error("create_case_file", e))?
        .is_some()
    {
        return Err(format!("Case file {} already exists", case_number));
    }

    let created = db
        .insert_case_file(&payload)
        .map_err(|e| user_error("create_case_file", e))?;
    tracing::info!(case_number = %created.case_number, direction = %created.direction, "Case file created");
    Ok(created)
}

pub async fn get_case_file(case_number: String, state: &AppState) -> Result<CaseFile, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    db.get_case_file(&case_number)
        .map_err(|e| user_error("get_case_file", e))?
        .ok_or_else(|| format!("Case file {} not found", case_number))
}

pub async fn list_case_files(state: &AppState) -> Result<Vec<CaseFile>, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    db.list_case_files()
        .map_err(|e| user_error("list_case_files", e))
}

/// Saves an edited case file. The case number itself never changes.
pub async fn update_case_file(
    case_number: String,
    payload: CaseFile,
    state: &AppState,
) -> Result<CaseFile, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let updated = db
        .update_case_file(&case_number, &payload)
        .map_err(|e| user_error("update_case_file", e))?;
    if updated == 0 {
        return Err(format!("Case file {} not found", case_number));
    }

    db.get_case_file(&case_number)
        .map_err(|e| user_error("update_case_file", e))?
        .ok_or_else(|| format!("Case file {} not found", case_number))
}

/// Deletes a case file together with its payment row.
pub async fn delete_case_file(case_number: String, state: &AppState) -> Result<(), String> {
    let mut db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let deleted = db
        .delete_case_file(&case_number)
        .map_err(|e| user_error("delete_case_file", e))?;
    if !deleted {
        return Err(format!("Case file {} not found", case_number));
    }
    tracing::info!(%case_number, "Case file and payment deleted");
    Ok(())
}

pub async fn get_payment_status(case_number: String, state: &AppState) -> Result<PaymentStatus, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let payment = db
        .get_payment(&case_number)
        .map_err(|e| user_error("get_payment_status", e))?;
    Ok(PaymentStatus::from_payment(payment.as_ref()))
}

/// Flips paid / unpaid and returns the new status.
pub async fn toggle_payment_status(case_number: String, state: &AppState) -> Result<PaymentStatus, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let paid = db
        .toggle_payment(&case_number)
        .map_err(|e| user_error("toggle_payment_status", e))?;
    tracing::info!(%case_number, paid, "Payment status toggled");
    Ok(if paid {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Unpaid
    })
}

pub async fn set_payment_status(
    case_number: String,
    status: PaymentStatus,
    state: &AppState,
) -> Result<(), String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    db.set_payment_status(&case_number, status.is_paid())
        .map_err(|e| user_error("set_payment_status", e))
}

/// Renders the dossier sheet from form data and saves it to the download
/// folder. Returns the saved file's path.
pub async fn download_case_file_pdf(payload: CaseFile, state: &AppState) -> Result<String, String> {
    if payload.case_number.trim().is_empty() {
        return Err("Enter a case number first".to_string());
    }

    let client = state
        .document_client()
        .map_err(|e| user_error("download_case_file_pdf", e))?;
    let folder = state
        .download_folder()
        .map_err(|e| user_error("download_case_file_pdf", e))?;

    let bytes = client
        .generate_case_file_pdf(&payload)
        .await
        .map_err(|e| user_error("download_case_file_pdf", e))?;
    let path = save_pdf(&folder, &case_file_pdf_name(&payload.case_number), &bytes)
        .await
        .map_err(|e| user_error("download_case_file_pdf", e))?;

    tracing::info!(case_number = %payload.case_number, path = %path.display(), "Dossier PDF saved");
    Ok(path.to_string_lossy().to_string())
}
