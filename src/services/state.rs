use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::db::Database;
use crate::models::Settings;
use crate::services::documents::DocumentClient;

pub const DEFAULT_DOCUMENT_SERVICE_URL: &str = "http://127.0.0.1:5000";

pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub settings: Arc<Mutex<Settings>>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
            settings: Arc::new(Mutex::new(settings)),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.settings.lock().map_err(|_| anyhow!("Settings lock"))?.clone())
    }

    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        let mut locked = self.settings.lock().map_err(|_| anyhow!("Settings lock"))?;
        *locked = settings;
        Ok(())
    }

    pub fn document_client(&self) -> Result<DocumentClient> {
        let settings = self.settings()?;
        Ok(DocumentClient::new(&settings.document_service_url)?)
    }

    /// Configured download folder, else the user's download directory.
    pub fn download_folder(&self) -> Result<PathBuf> {
        let settings = self.settings()?;
        settings
            .download_folder
            .filter(|folder| !folder.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .ok_or_else(|| anyhow!("No download folder configured"))
    }
}

pub fn load_settings(db: &Database) -> Settings {
    let document_service_url = db
        .get_setting("document_service_url")
        .ok()
        .flatten()
        .unwrap_or_else(|| DEFAULT_DOCUMENT_SERVICE_URL.to_string());
    let download_folder = db.get_setting("download_folder").ok().flatten();
    Settings {
        document_service_url,
        download_folder,
    }
}
