mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use common::{case_file, client_payload, test_state};
use transitaire::commands::{case_files, clients, invoices};
use transitaire::models::{Direction, InvoiceRoute, LineGroup, PaymentStatus};
use transitaire::services::error::ServiceError;
use transitaire::services::invoicing::{open_invoice, validate_invoice};
use transitaire::services::totals::{InvoiceDraft, TotalsError};
use transitaire::AppState;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn may_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

async fn with_case(state: &AppState, case_number: &str, direction: Direction, party: &str) {
    case_files::create_case_file(case_file(case_number, direction, party), state)
        .await
        .unwrap();
}

#[tokio::test]
async fn first_validation_allocates_the_first_number_of_the_year() {
    let state = test_state();
    with_case(&state, "IMP-100", Direction::Import, "Atlas Trading").await;

    let saved = validate_invoice(&state.db, "IMP-100", &InvoiceDraft::default(), may_2024()).unwrap();

    assert!(saved.created);
    assert_eq!(saved.number, "001/24");
    assert_eq!(saved.totals.grand_total, "1687.970");

    let db = state.db.lock().unwrap();
    let record = db.get_invoice_for_case("IMP-100").unwrap().unwrap();
    assert_eq!(record.number, "001/24");
    assert_eq!(record.document.header.date, "10/05/2024");
    assert_eq!(record.document.header.container, "MSCU1234567");
    assert_eq!(record.document.header.mark, "LOT 12");
    assert_eq!(record.document.header.customs_declaration, "8841 du 03/05/2024");
    assert_eq!(record.grand_total, dec("1687.97"));

    let payment = db.get_payment("IMP-100").unwrap().unwrap();
    assert!(!payment.paid);
    assert_eq!(payment.amount, Some(dec("1687.97")));
}

#[tokio::test]
async fn numbers_follow_each_other_and_restart_each_year() {
    let state = test_state();
    with_case(&state, "IMP-101", Direction::Import, "Atlas Trading").await;
    with_case(&state, "IMP-102", Direction::Import, "Atlas Trading").await;
    with_case(&state, "EXP-103", Direction::Export, "Olive Export").await;

    let draft = InvoiceDraft::default();
    let first = validate_invoice(&state.db, "IMP-101", &draft, may_2024()).unwrap();
    let second = validate_invoice(&state.db, "IMP-102", &draft, may_2024()).unwrap();
    let next_year = validate_invoice(
        &state.db,
        "EXP-103",
        &draft,
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
    )
    .unwrap();

    assert_eq!(first.number, "001/24");
    assert_eq!(second.number, "002/24");
    assert_eq!(next_year.number, "001/25");
}

#[tokio::test]
async fn revalidation_keeps_number_date_and_paid_flag() {
    let state = test_state();
    with_case(&state, "IMP-104", Direction::Import, "Atlas Trading").await;

    let first = validate_invoice(&state.db, "IMP-104", &InvoiceDraft::default(), may_2024()).unwrap();
    case_files::set_payment_status("IMP-104".to_string(), PaymentStatus::Paid, &state)
        .await
        .unwrap();

    let mut draft = InvoiceDraft::empty();
    draft.add_row(LineGroup::Transit);
    draft.set_amount(LineGroup::Transit, 0, "100");
    let later = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let second = validate_invoice(&state.db, "IMP-104", &draft, later).unwrap();

    assert!(!second.created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.number, "001/24");
    assert_eq!(second.totals.grand_total, "120.000");

    let db = state.db.lock().unwrap();
    let record = db.get_invoice_for_case("IMP-104").unwrap().unwrap();
    assert_eq!(record.document.header.date, "10/05/2024");
    assert!(record.document.header.modified_at.is_some());
    assert_eq!(record.grand_total, dec("120"));

    let payment = db.get_payment("IMP-104").unwrap().unwrap();
    assert!(payment.paid);
    assert_eq!(payment.amount, Some(dec("120")));
    assert_eq!(db.count_payments("IMP-104").unwrap(), 1);
}

#[tokio::test]
async fn unknown_case_file_is_not_invoiced() {
    let state = test_state();
    let err = validate_invoice(&state.db, "GHOST", &InvoiceDraft::default(), may_2024()).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(state.db.lock().unwrap().invoice_numbers_newest_first().unwrap().is_empty());
}

#[tokio::test]
async fn billing_block_comes_from_the_matching_client() {
    let state = test_state();
    clients::create_client(client_payload("Atlas Trading SARL", "C042"), &state)
        .await
        .unwrap();
    with_case(&state, "IMP-105", Direction::Import, "atlas trading").await;
    with_case(&state, "EXP-106", Direction::Export, "Unknown Shipper").await;

    validate_invoice(&state.db, "IMP-105", &InvoiceDraft::default(), may_2024()).unwrap();
    validate_invoice(&state.db, "EXP-106", &InvoiceDraft::default(), may_2024()).unwrap();

    let db = state.db.lock().unwrap();
    let matched = db.get_invoice_for_case("IMP-105").unwrap().unwrap().document.client;
    assert_eq!(matched.client_code, "C042");
    assert_eq!(matched.name, "atlas trading");
    assert_eq!(matched.vat_code, "C042/A/M/000");

    let unmatched = db.get_invoice_for_case("EXP-106").unwrap().unwrap().document.client;
    assert_eq!(unmatched.name, "Unknown Shipper");
    assert!(unmatched.client_code.is_empty());
    assert!(unmatched.address.is_empty());
}

#[tokio::test]
async fn open_invoice_routes_on_invoice_presence() {
    let state = test_state();
    with_case(&state, "IMP-107", Direction::Import, "Atlas Trading").await;

    let editor = invoices::open_invoice("IMP-107".to_string(), &state).await.unwrap();
    assert_eq!(editor.route, InvoiceRoute::Create);
    assert!(editor.invoice_number.is_none());
    assert_eq!(editor.draft, InvoiceDraft::default());

    let mut draft = InvoiceDraft::default();
    draft.declaration_uc = "UC-77".to_string();
    draft.set_stamp_duty("0.600");
    validate_invoice(&state.db, "IMP-107", &draft, may_2024()).unwrap();

    let editor = invoices::open_invoice("IMP-107".to_string(), &state).await.unwrap();
    assert_eq!(editor.route, InvoiceRoute::Edit);
    assert_eq!(editor.invoice_number.as_deref(), Some("001/24"));
    assert_eq!(editor.issued_on.as_deref(), Some("10/05/2024"));
    assert_eq!(editor.draft.declaration_uc, "UC-77");
    assert_eq!(editor.draft.stamp_duty, dec("0.6"));
}

#[tokio::test]
async fn deleting_a_case_file_drops_its_invoice() {
    let state = test_state();
    with_case(&state, "IMP-108", Direction::Import, "Atlas Trading").await;
    validate_invoice(&state.db, "IMP-108", &InvoiceDraft::default(), may_2024()).unwrap();

    case_files::delete_case_file("IMP-108".to_string(), &state).await.unwrap();

    let db = state.db.lock().unwrap();
    assert!(db.get_invoice_for_case("IMP-108").unwrap().is_none());
    assert_eq!(db.count_payments("IMP-108").unwrap(), 0);
}

#[tokio::test]
async fn totals_preview_does_not_store_anything() {
    let state = test_state();
    let mut draft = InvoiceDraft::empty();
    draft.add_row(LineGroup::Transport);
    draft.set_amount(LineGroup::Transport, 0, "200,5");

    let view = invoices::compute_invoice_totals(draft).await.unwrap();
    assert_eq!(view.taxable, "200.500");
    assert_eq!(view.vat_7, "14.035");
    assert_eq!(view.grand_total, "215.535");
    assert_eq!(view.in_words, "215 Dinars, 535 millimes");
    assert!(state.db.lock().unwrap().invoice_numbers_newest_first().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_amounts_are_reported_not_stored() {
    let state = test_state();
    with_case(&state, "IMP-109", Direction::Import, "Atlas Trading").await;

    let mut draft = InvoiceDraft::empty();
    draft.add_row(LineGroup::Disbursements);
    draft.add_row(LineGroup::Disbursements);
    draft.set_amount(LineGroup::Disbursements, 0, "79228162514264337593543950335");
    draft.set_amount(LineGroup::Disbursements, 1, "1");

    let err = invoices::compute_invoice_totals(draft.clone()).await.unwrap_err();
    assert!(err.contains("too large"));

    let err = validate_invoice(&state.db, "IMP-109", &draft, may_2024()).unwrap_err();
    assert!(matches!(err, ServiceError::Totals(TotalsError::Overflow)));

    let db = state.db.lock().unwrap();
    assert!(db.get_invoice_for_case("IMP-109").unwrap().is_none());
    assert!(db.get_payment("IMP-109").unwrap().is_none());
}

#[tokio::test]
async fn reopened_invoice_keeps_exact_amounts() {
    let state = test_state();
    with_case(&state, "IMP-110", Direction::Import, "Atlas Trading").await;

    let mut draft = InvoiceDraft::empty();
    draft.add_row(LineGroup::Transit);
    draft.set_amount(LineGroup::Transit, 0, "123456789012345.678");
    validate_invoice(&state.db, "IMP-110", &draft, may_2024()).unwrap();

    let editor = open_invoice(&state.db, "IMP-110").unwrap();
    assert_eq!(editor.draft.lines.transit[0].amount, dec("123456789012345.678"));
    assert_eq!(editor.totals.grand_total, "146913578924692.357");

    let record = state.db.lock().unwrap().get_invoice_for_case("IMP-110").unwrap().unwrap();
    assert_eq!(record.document.totals.grand_total, record.grand_total);
    assert_eq!(record.grand_total, dec("146913578924692.35682"));
}
