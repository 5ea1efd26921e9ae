use keyring::Entry;
use tracing::{info, warn};

use crate::error::DetectorError;
use crate::llm::settings::{keychain_service, KEYCHAIN_ACCOUNT};

fn entry_for(provider: &str) -> Result<Entry, DetectorError> {
    let service = keychain_service(provider)?;
    Entry::new(&service, KEYCHAIN_ACCOUNT).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", service, e);
        DetectorError::Keychain(e.to_string())
    })
}

/// Read the stored API key for a provider. `Ok(None)` when none is set.
pub fn read_api_key(provider: &str) -> Result<Option<String>, DetectorError> {
    match entry_for(provider)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            info!("No API key found for provider: {}", provider);
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to get password for {}: {}", provider, e);
            Err(DetectorError::Keychain(e.to_string()))
        }
    }
}

#[tauri::command]
pub fn set_api_key(provider: &str, key: &str) -> Result<(), String> {
    info!("Setting API key for provider: {}", provider);
    let key = key.trim();
    if key.is_empty() {
        return Err(DetectorError::Validation("API key must not be empty".to_string()).into());
    }
    entry_for(provider)?.set_password(key).map_err(|e| {
        warn!("Failed to set password for {}: {}", provider, e);
        DetectorError::Keychain(e.to_string()).into()
    })
}

#[tauri::command]
pub fn get_api_key(provider: &str) -> Result<Option<String>, String> {
    info!("Getting API key for provider: {}", provider);
    Ok(read_api_key(provider)?)
}

#[tauri::command]
pub fn delete_api_key(provider: &str) -> Result<(), String> {
    info!("Deleting API key for provider: {}", provider);
    entry_for(provider)?.delete_credential().map_err(|e| {
        warn!("Failed to delete credential for {}: {}", provider, e);
        DetectorError::Keychain(e.to_string()).into()
    })
}
