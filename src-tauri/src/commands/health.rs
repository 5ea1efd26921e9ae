use serde::Serialize;
use tauri::Manager;
use tracing::info;

use super::config::resolve_llm_settings;
use super::keychain::read_api_key;
use crate::llm::PROVIDERS;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderKeyStatus {
    pub provider: String,
    pub api_key_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub api_keys: Vec<ProviderKeyStatus>,
    /// Provider and model the next analysis will use, when a key is available.
    pub active_provider: Option<String>,
    pub active_model: Option<String>,
    pub data_dir_accessible: bool,
    pub data_dir_path: Option<String>,
}

#[tauri::command]
pub fn run_health_check(app: tauri::AppHandle) -> Result<HealthReport, String> {
    info!("Running health check");

    let api_keys: Vec<ProviderKeyStatus> = PROVIDERS
        .iter()
        .map(|provider| ProviderKeyStatus {
            provider: provider.to_string(),
            api_key_set: matches!(read_api_key(provider), Ok(Some(_))),
        })
        .collect();
    for status in &api_keys {
        info!("{} API key set: {}", status.provider, status.api_key_set);
    }

    let (active_provider, active_model) = match resolve_llm_settings(&app) {
        Ok(settings) => (Some(settings.provider), Some(settings.model)),
        Err(e) => {
            info!("No usable AI provider: {}", e);
            (None, None)
        }
    };

    let data_dir = app.path().app_data_dir().ok();
    let data_dir_accessible = data_dir
        .as_ref()
        .map(|dir| dir.exists() && dir.is_dir())
        .unwrap_or(false);
    info!("Data directory accessible: {} at {:?}", data_dir_accessible, data_dir);

    Ok(HealthReport {
        api_keys,
        active_provider,
        active_model,
        data_dir_accessible,
        data_dir_path: data_dir.map(|d| d.to_string_lossy().to_string()),
    })
}
