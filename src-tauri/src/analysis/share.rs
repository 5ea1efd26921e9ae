//! Shareable preview links.
//!
//! An AnalysisResult is serialized to JSON, base64-encoded, and carried in
//! the `preview` query parameter. Decoding accepts the full link or just
//! the parameter value.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{info, warn};
use url::Url;

use super::types::AnalysisResult;
use crate::error::DetectorError;

/// Query parameter holding the encoded result.
pub const PREVIEW_PARAM: &str = "preview";

/// Encode a result as the value of the `preview` parameter (not yet percent-encoded).
pub fn encode_preview(result: &AnalysisResult) -> Result<String, DetectorError> {
    let json = serde_json::to_string(result)
        .map_err(|e| DetectorError::Validation(format!("Failed to serialize result: {}", e)))?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decode a `preview` parameter value back into a result.
/// Tolerates a value that is still percent-encoded.
pub fn decode_preview(param: &str) -> Result<AnalysisResult, DetectorError> {
    let trimmed = param.trim();
    if trimmed.is_empty() {
        return Err(DetectorError::Validation("Preview link is empty".to_string()));
    }

    let unescaped = urlencoding::decode(trimmed)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| trimmed.to_string());

    let bytes = STANDARD.decode(unescaped.as_bytes()).map_err(|e| {
        warn!("Preview parameter is not valid base64: {}", e);
        DetectorError::Validation(format!("Invalid preview link: {}", e))
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("Preview parameter does not hold an analysis result: {}", e);
        DetectorError::Validation(format!("Invalid preview link: {}", e))
    })
}

/// Build a full share link from the page URL, replacing any existing preview.
pub fn build_share_link(base_url: &str, result: &AnalysisResult) -> Result<String, DetectorError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| DetectorError::Validation(format!("Invalid base URL '{}': {}", base_url, e)))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != PREVIEW_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let encoded = encode_preview(result)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(PREVIEW_PARAM, &encoded);
    }
    url.set_fragment(None);

    info!("Created share link ({} bytes)", url.as_str().len());
    Ok(url.into())
}

/// Decode a share link. Accepts a full URL carrying `?preview=` or a bare parameter value.
pub fn parse_share_link(link: &str) -> Result<AnalysisResult, DetectorError> {
    match Url::parse(link.trim()) {
        Ok(url) => {
            let param = url
                .query_pairs()
                .find(|(k, _)| k == PREVIEW_PARAM)
                .map(|(_, v)| v.into_owned())
                .ok_or_else(|| {
                    DetectorError::Validation("Link has no preview parameter".to_string())
                })?;
            decode_preview(&param)
        }
        Err(_) => decode_preview(link),
    }
}
