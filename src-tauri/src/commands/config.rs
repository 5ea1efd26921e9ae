use tauri::AppHandle;
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

use super::keychain::read_api_key;
use crate::error::DetectorError;
use crate::llm::{default_model, LlmSettings, DEFAULT_PROVIDER};

pub const PREFERENCES_STORE: &str = "preferences.json";
pub const PREF_PROVIDER: &str = "ai_provider";
pub const PREF_MODEL: &str = "ai_model";

fn read_preference(app: &AppHandle, key: &str) -> Result<Option<String>, DetectorError> {
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        DetectorError::Config(e.to_string())
    })?;
    Ok(store
        .get(key)
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .filter(|s| !s.is_empty()))
}

/// Provider, model, and API key for the next model call.
pub fn resolve_llm_settings(app: &AppHandle) -> Result<LlmSettings, DetectorError> {
    let provider =
        read_preference(app, PREF_PROVIDER)?.unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    let model = read_preference(app, PREF_MODEL)?
        .unwrap_or_else(|| default_model(&provider).to_string());

    let api_key = read_api_key(&provider)?.ok_or_else(|| {
        DetectorError::Config(format!(
            "No API key configured for '{}'. Please set it in Settings.",
            provider
        ))
    })?;

    Ok(LlmSettings {
        provider,
        model,
        api_key,
    })
}

#[tauri::command]
pub fn get_preference(app: AppHandle, key: &str) -> Result<Option<String>, String> {
    info!("Getting preference: {}", key);
    Ok(read_preference(&app, key)?)
}

#[tauri::command]
pub fn set_preference(app: AppHandle, key: &str, value: &str) -> Result<(), String> {
    info!("Setting preference: {} = {}", key, value);
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        e.to_string()
    })?;
    store.set(key, serde_json::json!(value));
    store.save().map_err(|e| {
        warn!("Failed to save store: {}", e);
        e.to_string()
    })
}
