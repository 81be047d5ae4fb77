use rust_decimal::Decimal;

use crate::commands::user_error;
use crate::models::{
    ArchiveEntry, ArchiveFilter, ArchiveView, CaseFileOverview, ClientBalance, InvoiceRoute,
    PaymentStatus, UnpaidSummary,
};
use crate::services::state::AppState;

/// Case files for the follow-up screen: unpaid ones first, each list newest
/// first, with the outstanding amount per client.
pub async fn get_archive(filter: ArchiveFilter, state: &AppState) -> Result<ArchiveView, String> {
    let overviews = {
        let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
        db.list_case_file_overviews()
            .map_err(|e| user_error("get_archive", e))?
    };
    Ok(build_archive(overviews, &filter))
}

pub fn build_archive(overviews: Vec<CaseFileOverview>, filter: &ArchiveFilter) -> ArchiveView {
    let needle = filter.search.trim().to_lowercase();

    let mut entries: Vec<ArchiveEntry> = overviews
        .into_iter()
        .map(to_entry)
        .filter(|entry| filter.status.matches(entry.status))
        .filter(|entry| {
            needle.is_empty()
                || entry.case_number.to_lowercase().contains(&needle)
                || entry.recipient.to_lowercase().contains(&needle)
        })
        .collect();

    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let unpaid_summary = summarize_unpaid(&entries);
    let (paid, unpaid): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.status.is_paid());

    ArchiveView {
        unpaid,
        paid,
        unpaid_summary,
    }
}

fn to_entry(overview: CaseFileOverview) -> ArchiveEntry {
    let status = PaymentStatus::from_payment(overview.payment.as_ref());
    let case_file = overview.case_file;
    ArchiveEntry {
        case_number: case_file.case_number,
        direction: case_file.direction,
        recipient: case_file.recipient.trim().to_string(),
        sender: case_file.sender,
        created_at: case_file.created_at,
        invoice_id: overview.invoice_id,
        invoice_number: overview.invoice_number,
        invoice_amount: overview.invoice_amount,
        status,
        route: InvoiceRoute::for_case(overview.has_invoice),
    }
}

fn summarize_unpaid(entries: &[ArchiveEntry]) -> UnpaidSummary {
    let mut summary = UnpaidSummary::default();

    for entry in entries.iter().filter(|entry| !entry.status.is_paid()) {
        summary.total += entry.invoice_amount;

        let (key, name) = if entry.recipient.is_empty() {
            ("inconnu".to_string(), "Client inconnu".to_string())
        } else {
            (entry.recipient.to_lowercase(), entry.recipient.clone())
        };
        summary
            .by_client
            .entry(key)
            .or_insert_with(|| ClientBalance {
                name,
                amount: Decimal::ZERO,
            })
            .amount += entry.invoice_amount;
    }

    summary
}
