//! Tauri commands for the detector session: analysis, rephrasing,
//! history, and share links.

use tauri::{AppHandle, Emitter, State};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use super::config::resolve_llm_settings;
use crate::analysis::{parse_share_link, AnalysisResult};
use crate::detector::{LlmRewriter, LlmScorer};
use crate::error::DetectorError;
use crate::llm::LlmClient;
use crate::rephrase::{RephraseGuard, RephraseStatus};
use crate::session::{SessionController, SessionSnapshot};

/// Event carrying rephrase progress messages to the front end.
pub const REPHRASE_STATUS_EVENT: &str = "rephrase-status";

/// Managed state. The guard is checked before taking the session lock so a
/// second rephrase is rejected instead of queued behind the first.
pub struct AppState {
    pub session: Mutex<SessionController>,
    pub guard: RephraseGuard,
}

impl AppState {
    pub fn new(session: SessionController) -> Self {
        let guard = session.guard().clone();
        Self {
            session: Mutex::new(session),
            guard,
        }
    }
}

fn llm_collaborators(app: &AppHandle) -> Result<(LlmScorer, LlmRewriter), DetectorError> {
    let settings = resolve_llm_settings(app)?;
    let client = LlmClient::new(settings).map_err(DetectorError::Config)?;
    Ok((LlmScorer::new(client.clone()), LlmRewriter::new(client)))
}

/// Channel whose messages are re-emitted as `rephrase-status` events.
/// The forwarding task ends once the sender is dropped.
fn status_forwarder(
    app: &AppHandle,
) -> (
    mpsc::UnboundedSender<RephraseStatus>,
    tauri::async_runtime::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<RephraseStatus>();
    let app = app.clone();
    let handle = tauri::async_runtime::spawn(async move {
        while let Some(status) = rx.recv().await {
            if let Err(e) = app.emit(REPHRASE_STATUS_EVENT, status.to_string()) {
                warn!("Failed to emit rephrase status: {}", e);
            }
        }
    });
    (tx, handle)
}

#[tauri::command]
pub async fn analyze_content(
    app: AppHandle,
    state: State<'_, AppState>,
    text: String,
) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().await;
    let (scorer, _) = match llm_collaborators(&app) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            session.record_error(&e);
            return Err(e.into());
        }
    };

    session.analyze(&scorer, &text).await?;
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn auto_rephrase(
    app: AppHandle,
    state: State<'_, AppState>,
    text: String,
) -> Result<SessionSnapshot, String> {
    let token = state.guard.try_acquire()?;
    let mut session = state.session.lock().await;
    let (scorer, rewriter) = match llm_collaborators(&app) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            session.record_error(&e);
            return Err(e.into());
        }
    };

    let (tx, forwarder) = status_forwarder(&app);
    let outcome = session
        .auto_rephrase(token, &scorer, &rewriter, &text, &tx)
        .await;
    drop(tx);
    let _ = forwarder.await;

    let outcome = outcome?;
    info!(
        "Auto-rephrase done: {}% -> {}% in {} attempt(s)",
        outcome.initial_score, outcome.best_score, outcome.attempts
    );
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn rephrase_with_instruction(
    app: AppHandle,
    state: State<'_, AppState>,
    text: String,
    instruction: String,
) -> Result<SessionSnapshot, String> {
    let token = state.guard.try_acquire()?;
    let mut session = state.session.lock().await;
    let (_, rewriter) = match llm_collaborators(&app) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            session.record_error(&e);
            return Err(e.into());
        }
    };

    let (tx, forwarder) = status_forwarder(&app);
    let result = session
        .rephrase_with_instruction(token, &rewriter, &text, &instruction, &tx)
        .await
        .map(|_| ());
    drop(tx);
    let _ = forwarder.await;

    result?;
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn accept_rephrase(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().await;
    let (scorer, _) = match llm_collaborators(&app) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            session.record_error(&e);
            return Err(e.into());
        }
    };

    session.accept_rephrase(&scorer).await?;
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn discard_rephrase(state: State<'_, AppState>) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().await;
    session.discard_rephrase();
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn select_history_item(
    state: State<'_, AppState>,
    text: String,
) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().await;
    session.select_history_item(&text);
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn list_history(state: State<'_, AppState>) -> Result<Vec<String>, String> {
    let session = state.session.lock().await;
    Ok(session.history().to_vec())
}

#[tauri::command]
pub async fn clear_history(state: State<'_, AppState>) -> Result<(), String> {
    let mut session = state.session.lock().await;
    session.clear_history();
    Ok(())
}

/// Current snapshot. Fails with `Busy` while a rephrase holds the session
/// rather than waiting for the loop to finish.
#[tauri::command]
pub async fn get_session(state: State<'_, AppState>) -> Result<SessionSnapshot, String> {
    match state.session.try_lock() {
        Ok(session) => Ok(session.snapshot()),
        Err(_) => Err(DetectorError::Busy.into()),
    }
}

#[tauri::command]
pub async fn clear_error(state: State<'_, AppState>) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().await;
    session.clear_error();
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn create_share_link(
    state: State<'_, AppState>,
    base_url: String,
) -> Result<String, String> {
    let session = state.session.lock().await;
    Ok(session.create_share_link(&base_url)?)
}

#[tauri::command]
pub fn decode_share_link(link: &str) -> Result<AnalysisResult, String> {
    Ok(parse_share_link(link)?)
}
