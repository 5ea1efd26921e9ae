//! Mapping and sanity checks for model-produced analysis JSON.
//!
//! Models occasionally return fractional or out-of-range scores, numeric
//! strings, or platforms outside the supported set. Scores are rounded and
//! clamped to 0-100; malformed entries are dropped with a warning. Only a
//! missing overall score is fatal.

use serde_json::Value;
use tracing::warn;

use super::types::{AnalysisData, AnalysisMetric, AnalysisResult, ExternalPlatformAnalysis, Platform};

/// Read a 0-100 score from a JSON value, rounding and clamping as needed.
/// Accepts numbers and numeric strings (with an optional trailing `%`).
pub fn clamp_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

/// Map the raw model response JSON to an AnalysisResult.
///
/// Accepts either the bare data object or one wrapped in `{"data": ...}`.
pub fn map_response_to_analysis(json: &Value) -> Result<AnalysisResult, String> {
    let data = match json.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => json,
    };

    if !data.is_object() {
        return Err("Analysis response is not a JSON object".to_string());
    }

    let ai_score = clamp_score(&data["aiScore"]).ok_or("Missing or invalid 'aiScore' field")?;
    let summary = data["summary"].as_str().unwrap_or_default().trim().to_string();

    let analysis = data["analysis"]
        .as_array()
        .map(|items| items.iter().filter_map(map_metric).collect())
        .unwrap_or_default();

    let mut external_analysis: Vec<ExternalPlatformAnalysis> = Vec::new();
    for item in data["externalAnalysis"].as_array().into_iter().flatten() {
        if let Some(entry) = map_platform(item) {
            if external_analysis
                .iter()
                .any(|e| e.platform_name == entry.platform_name)
            {
                warn!("Duplicate estimate for {}, keeping the first", entry.platform_name);
                continue;
            }
            external_analysis.push(entry);
        }
    }

    Ok(AnalysisResult {
        data: AnalysisData {
            ai_score,
            summary,
            analysis,
            external_analysis,
        },
    })
}

fn map_metric(item: &Value) -> Option<AnalysisMetric> {
    let metric = item["metric"].as_str().map(str::trim).filter(|m| !m.is_empty());
    let score = clamp_score(&item["score"]);
    match (metric, score) {
        (Some(metric), Some(score)) => Some(AnalysisMetric {
            metric: metric.to_string(),
            finding: item["finding"].as_str().unwrap_or_default().trim().to_string(),
            score,
        }),
        _ => {
            warn!("Dropping malformed analysis metric: {}", item);
            None
        }
    }
}

fn map_platform(item: &Value) -> Option<ExternalPlatformAnalysis> {
    let name = item["platformName"].as_str().unwrap_or_default();
    let Some(platform) = Platform::from_name(name) else {
        warn!("Ignoring estimate for unsupported platform '{}'", name);
        return None;
    };
    let Some(predicted_score) = clamp_score(&item["predictedScore"]) else {
        warn!("Ignoring {} estimate without a usable score", platform);
        return None;
    };
    Some(ExternalPlatformAnalysis {
        platform_name: platform,
        predicted_score,
        summary: item["summary"].as_str().unwrap_or_default().trim().to_string(),
    })
}
