pub mod analysis;
mod commands;
pub mod config;
pub mod detector;
mod error;
pub mod history;
pub mod llm;
pub mod rephrase;
pub mod session;

use std::path::Path;

use tauri::Manager;
use tracing::{info, warn};

pub use analysis::{AnalysisData, AnalysisMetric, AnalysisResult, ExternalPlatformAnalysis, Platform};
pub use config::{default_config, load_config, DetectorConfig, HistorySettings, RephraseSettings};
pub use error::DetectorError;
pub use history::{AnalysisHistory, HistorySlot, MemorySlot, SqliteSlot};
pub use session::{PendingRephrase, SessionController, SessionSnapshot};

/// Config file users may drop into the app config directory to tune the loop.
const CONFIG_FILE_NAME: &str = "detector.toml";
const HISTORY_DB_NAME: &str = "history.db";

/// Custom config from `config_dir` when present and valid, else the embedded default.
fn resolve_config(config_dir: Option<&Path>) -> DetectorConfig {
    let Some(path) = config_dir.map(|dir| dir.join(CONFIG_FILE_NAME)) else {
        return default_config();
    };
    if !path.exists() {
        return default_config();
    }
    match load_config(&path) {
        Ok(config) => {
            info!("Loaded detector config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("Ignoring invalid config at {:?}: {}", path, e);
            default_config()
        }
    }
}

/// History backed by SQLite in `data_dir`, or kept in memory when the
/// database cannot be opened.
fn open_history(data_dir: Option<&Path>, settings: &HistorySettings) -> AnalysisHistory {
    let slot: Box<dyn HistorySlot> = match data_dir.map(|dir| SqliteSlot::open(&dir.join(HISTORY_DB_NAME))) {
        Some(Ok(slot)) => Box::new(slot),
        Some(Err(e)) => {
            warn!("History will not persist: {}", e);
            Box::new(MemorySlot::new())
        }
        None => {
            warn!("No app data directory; history will not persist");
            Box::new(MemorySlot::new())
        }
    };
    AnalysisHistory::open(slot, settings)
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_store::Builder::new().build())
        .invoke_handler(tauri::generate_handler![
            commands::session::analyze_content,
            commands::session::auto_rephrase,
            commands::session::rephrase_with_instruction,
            commands::session::accept_rephrase,
            commands::session::discard_rephrase,
            commands::session::select_history_item,
            commands::session::list_history,
            commands::session::clear_history,
            commands::session::get_session,
            commands::session::clear_error,
            commands::session::create_share_link,
            commands::session::decode_share_link,
            commands::keychain::set_api_key,
            commands::keychain::get_api_key,
            commands::keychain::delete_api_key,
            commands::config::get_preference,
            commands::config::set_preference,
            commands::models::list_models,
            commands::health::run_health_check,
        ])
        .setup(|app| {
            let config_dir = app.path().app_config_dir().ok();
            let data_dir = app.path().app_data_dir().ok();

            let config = resolve_config(config_dir.as_deref());
            let history = open_history(data_dir.as_deref(), &config.history);
            let session = SessionController::new(
                history,
                config.rephrase.clone(),
                rephrase::RephraseGuard::new(),
            );
            app.manage(commands::session::AppState::new(session));
            info!(
                "Detector ready: {} attempts, history limit {}",
                config.rephrase.max_attempts, config.history.limit
            );
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
