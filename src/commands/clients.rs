use crate::commands::user_error;
use crate::models::{Client, ClientPayload};
use crate::services::state::AppState;

/// Clients newest first, optionally narrowed to names or codes containing
/// `search`.
pub async fn get_clients(search: Option<String>, state: &AppState) -> Result<Vec<Client>, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let clients = db
        .list_clients()
        .map_err(|e| user_error("get_clients", e))?;

    Ok(match search.map(|s| s.trim().to_lowercase()) {
        Some(needle) if !needle.is_empty() => clients
            .into_iter()
            .filter(|client| {
                client.name.to_lowercase().contains(&needle)
                    || client.code.to_lowercase().contains(&needle)
            })
            .collect(),
        _ => clients,
    })
}

pub async fn create_client(payload: ClientPayload, state: &AppState) -> Result<Client, String> {
    if payload.name.trim().is_empty() {
        return Err("A client name is required".to_string());
    }

    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let client = db
        .insert_client(&payload)
        .map_err(|e| user_error("create_client", e))?;
    tracing::info!(client_id = %client.id, name = %client.name, "Client created");
    Ok(client)
}

pub async fn delete_client(id: String, state: &AppState) -> Result<(), String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let deleted = db
        .delete_client(&id)
        .map_err(|e| user_error("delete_client", e))?;
    if !deleted {
        return Err("Client not found".to_string());
    }
    Ok(())
}
