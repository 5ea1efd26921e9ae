//! Prompts and schemas for the scoring and rewriting model calls.

/// System prompt for scoring calls.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert linguist who detects AI-generated writing. \
    Always respond with valid JSON only, no markdown formatting or code blocks.";

/// System prompt for rewriting calls.
pub const REWRITE_SYSTEM_PROMPT: &str = "You are a skilled human editor. \
    Respond with the rewritten text only: no preamble, no quotes, no commentary.";

/// Instruction used by the auto-rephrase loop when the user gave none.
pub const DEFAULT_REWRITE_INSTRUCTION: &str = "Rewrite the text so it reads as naturally human-written. \
    Vary sentence length and structure, prefer concrete wording over generic phrasing, \
    avoid stock transitions (\"furthermore\", \"moreover\", \"in conclusion\"), \
    and keep the original meaning, facts, and approximate length.";

/// Dimensions the model is asked to score, in display order.
pub const ANALYSIS_METRICS: [&str; 5] = [
    "Perplexity",
    "Burstiness",
    "Tone & Voice",
    "Repetitive Phrasing",
    "Vocabulary Predictability",
];

/// JSON schema for structured analysis output.
/// Matches the AnalysisData type.
pub fn analysis_json_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "aiScore": {
                "type": "integer",
                "description": "0-100 likelihood that the text is AI-generated"
            },
            "summary": {
                "type": "string",
                "description": "One-sentence verdict"
            },
            "analysis": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "metric": { "type": "string" },
                        "finding": { "type": "string" },
                        "score": { "type": "integer" }
                    },
                    "required": ["metric", "finding", "score"],
                    "additionalProperties": false
                }
            },
            "externalAnalysis": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "platformName": {
                            "type": "string",
                            "enum": ["ZeroGPT", "QuillBot", "Copyleaks"]
                        },
                        "predictedScore": { "type": "integer" },
                        "summary": { "type": "string" }
                    },
                    "required": ["platformName", "predictedScore", "summary"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["aiScore", "summary", "analysis", "externalAnalysis"],
        "additionalProperties": false
    })
}

/// Build the scoring prompt for a piece of text.
pub fn build_analysis_prompt(text: &str) -> String {
    let metrics = ANALYSIS_METRICS
        .iter()
        .map(|m| format!("- {}", m))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following text and estimate how likely it is to be AI-generated.

Inspect these dimensions and give each a score from 0 (clearly human) to 100 (clearly AI):
{metrics}

Then estimate the percentage each of these third-party detectors would report: ZeroGPT, QuillBot, Copyleaks.
These are predictions based on the patterns each tool is known to weigh, not live results.

Return JSON with this shape:
{{
  "aiScore": <integer 0-100>,
  "summary": "<one sentence verdict>",
  "analysis": [{{"metric": "<name>", "finding": "<what you observed>", "score": <integer 0-100>}}],
  "externalAnalysis": [{{"platformName": "ZeroGPT" | "QuillBot" | "Copyleaks", "predictedScore": <integer 0-100>, "summary": "<short explanation>"}}]
}}

Text to analyze:
"""
{text}
""""#,
        metrics = metrics,
        text = text,
    )
}

/// Build the rewriting prompt. `None` uses the AI-pattern-reducing default.
pub fn build_rewrite_prompt(text: &str, instruction: Option<&str>) -> String {
    let instruction = instruction
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_REWRITE_INSTRUCTION);

    format!(
        r#"{instruction}

Text to rewrite:
"""
{text}
""""#,
        instruction = instruction,
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_schema_structure() {
        let schema = analysis_json_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["aiScore"].is_object());
        assert!(schema["properties"]["analysis"].is_object());
        assert!(schema["properties"]["externalAnalysis"].is_object());
    }

    #[test]
    fn test_analysis_schema_platforms() {
        let schema = analysis_json_schema();
        let platforms: Vec<&str> = schema["properties"]["externalAnalysis"]["items"]["properties"]
            ["platformName"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(platforms, vec!["ZeroGPT", "QuillBot", "Copyleaks"]);
    }

    #[test]
    fn test_analysis_prompt_includes_text_and_metrics() {
        let prompt = build_analysis_prompt("The quick brown fox.");
        assert!(prompt.contains("The quick brown fox."));
        for metric in ANALYSIS_METRICS {
            assert!(prompt.contains(metric), "missing metric {}", metric);
        }
        assert!(prompt.contains("Copyleaks"));
    }

    #[test]
    fn test_rewrite_prompt_default_instruction() {
        let prompt = build_rewrite_prompt("Some text.", None);
        assert!(prompt.starts_with(DEFAULT_REWRITE_INSTRUCTION));
        assert!(prompt.contains("Some text."));
    }

    #[test]
    fn test_rewrite_prompt_custom_instruction() {
        let prompt = build_rewrite_prompt("Some text.", Some("Make it sound casual"));
        assert!(prompt.starts_with("Make it sound casual"));
        assert!(!prompt.contains(DEFAULT_REWRITE_INSTRUCTION));
    }

    #[test]
    fn test_rewrite_prompt_blank_instruction_falls_back() {
        let prompt = build_rewrite_prompt("Some text.", Some("   "));
        assert!(prompt.starts_with(DEFAULT_REWRITE_INSTRUCTION));
    }
}
