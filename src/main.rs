use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use transitaire::commands;
use transitaire::services::state::{load_settings, AppState};
use transitaire::Database;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_path = database_path()?;
    tracing::info!(path = %db_path.display(), "Opening store");
    let db = Database::new(db_path)?;

    if let Ok(url) = std::env::var("TRANSITAIRE_API_URL") {
        db.set_setting("document_service_url", url.trim())?;
    }
    if let Ok(folder) = std::env::var("TRANSITAIRE_DOWNLOAD_DIR") {
        db.set_setting("download_folder", folder.trim())?;
    }
    let settings = load_settings(&db);
    tracing::info!(document_service = %settings.document_service_url, "Settings loaded");

    let state = AppState::new(db, settings);
    let stats = commands::dashboard::get_dashboard_stats(None, &state)
        .await
        .map_err(|e| anyhow!(e))?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

fn database_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TRANSITAIRE_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("No data directory available"))?
        .join("transitaire");
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join("transitaire.sqlite"))
}
