//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use transitaire::models::{CaseFile, ClientPayload, Direction, Settings};
use transitaire::{AppState, Database};

pub fn test_state() -> AppState {
    test_state_with(Settings {
        document_service_url: "http://127.0.0.1:9".to_string(),
        download_folder: None,
    })
}

pub fn test_state_with(settings: Settings) -> AppState {
    let db = Database::open_in_memory().expect("Failed to open in-memory store");
    AppState::new(db, settings)
}

pub fn case_file(case_number: &str, direction: Direction, party: &str) -> CaseFile {
    let mut case_file = CaseFile::new(case_number, direction);
    match direction {
        Direction::Import => {
            case_file.recipient = party.to_string();
            case_file.sender = "Shanghai Export Co".to_string();
        }
        Direction::Export => {
            case_file.sender = party.to_string();
            case_file.recipient = "Marseille Import SA".to_string();
        }
    }
    case_file.vessel = "CARTHAGE".to_string();
    case_file.arrival_date = "02/05/2024".to_string();
    case_file.loading_date = "20/04/2024".to_string();
    case_file.container_ref = "MSCU1234567\"LOT 12".to_string();
    case_file.declaration_number = "8841".to_string();
    case_file.declaration_date = "03/05/2024".to_string();
    case_file.customs_value = "12500.000".to_string();
    case_file
}

pub fn created(mut case_file: CaseFile, created_at: &str) -> CaseFile {
    case_file.created_at = Some(created_at.to_string());
    case_file
}

pub fn client_payload(name: &str, code: &str) -> ClientPayload {
    ClientPayload {
        code: code.to_string(),
        name: name.to_string(),
        address: format!("{} street, Tunis", code),
        vat_code: format!("{}/A/M/000", code),
    }
}
