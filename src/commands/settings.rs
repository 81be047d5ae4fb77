use serde::Deserialize;

use crate::commands::user_error;
use crate::models::Settings;
use crate::services::documents::DocumentClient;
use crate::services::state::{load_settings, AppState};

#[derive(Deserialize)]
pub struct SettingsPayload {
    pub document_service_url: Option<String>,
    pub download_folder: Option<String>,
}

pub async fn get_settings(state: &AppState) -> Result<Settings, String> {
    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    Ok(load_settings(&db))
}

pub async fn save_settings(payload: SettingsPayload, state: &AppState) -> Result<Settings, String> {
    {
        let db = state.db.lock().map_err(|_| "DB lock".to_string())?;

        if let Some(url) = payload.document_service_url.clone() {
            DocumentClient::new(&url).map_err(|e| user_error("save_settings", e))?;
            db.set_setting("document_service_url", url.trim())
                .map_err(|e| user_error("save_settings", e))?;
        }
        if let Some(folder) = payload.download_folder.clone() {
            db.set_setting("download_folder", folder.trim())
                .map_err(|e| user_error("save_settings", e))?;
        }
    }

    let settings = get_settings(state).await?;
    state
        .update_settings(settings.clone())
        .map_err(|e| user_error("save_settings", e))?;

    Ok(settings)
}
