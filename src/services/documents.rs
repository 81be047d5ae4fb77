//! Client for the PDF generation service.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::CaseFile;
use crate::utils::safe_file_stem;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid document service URL: {0:?}")]
    InvalidUrl(String),

    #[error("Document service unreachable: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Document service error {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct DocumentClient {
    base_url: String,
    http: reqwest::Client,
}

impl DocumentClient {
    pub fn new(base_url: &str) -> Result<Self, DocumentError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DocumentError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(DocumentClient { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Renders the blank dossier sheet for a case file, from form data that
    /// does not need to be saved first.
    pub async fn generate_case_file_pdf(&self, case_file: &CaseFile) -> Result<Vec<u8>, DocumentError> {
        let url = format!("{}/generate-pdf", self.base_url);
        tracing::debug!(%url, case_number = %case_file.case_number, "Requesting dossier PDF");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/pdf")
            .json(case_file)
            .send()
            .await?;

        read_pdf(response).await
    }

    /// Renders a stored invoice.
    pub async fn fetch_invoice_pdf(&self, invoice_id: i64) -> Result<Vec<u8>, DocumentError> {
        let url = format!("{}/facture/{}", self.base_url, invoice_id);
        tracing::debug!(%url, invoice_id, "Requesting invoice PDF");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/pdf")
            .send()
            .await?;

        read_pdf(response).await
    }
}

async fn read_pdf(response: reqwest::Response) -> Result<Vec<u8>, DocumentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DocumentError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.bytes().await?.to_vec())
}

pub fn case_file_pdf_name(case_number: &str) -> String {
    format!("Dossier_{}.pdf", safe_file_stem(case_number))
}

/// Named after the invoice number, or its id when the number is blank.
pub fn invoice_pdf_name(invoice_number: &str, invoice_id: i64) -> String {
    let stem = safe_file_stem(invoice_number);
    if stem.is_empty() {
        format!("facture_{}.pdf", invoice_id)
    } else {
        format!("facture_{}.pdf", stem)
    }
}

/// Writes a downloaded PDF into `folder`, replacing any previous copy.
pub async fn save_pdf(folder: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(folder).await?;
    let path = folder.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Hands a saved document to the platform viewer.
pub fn open_document(path: &Path) -> std::io::Result<()> {
    open::that(path)
}
