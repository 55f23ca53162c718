//! Remote classification through a generative model.
//!
//! Encodes a prompt into an instruction with a strict JSON output contract,
//! sends it through an [`LlmActor`], and normalizes the decoded reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::actors::messages::ClassifierError;
use crate::actors::traits::LlmActor;
use crate::brain::{ClassificationResult, PromptType, ResultSource, Score};

const INSTRUCTION_PREAMBLE: &str = r#"You are an assistant that analyzes how people use AI models.
Given a single user prompt (something they would ask ChatGPT/Gemini),
you will classify it and score it based on how much it grows their mind
versus how much it makes them dependent.

Respond ONLY with valid JSON in this exact format, no markdown, no extra text:

{
  "promptType": "Learning" | "Delegation" | "Creation" | "Trivial" | "Mixed",
  "growthScore": 0-100,
  "dependencyScore": 0-100,
  "shortFeedback": "one or two sentences of constructive feedback"
}

User prompt:"#;

const PROMPT_DELIMITER: &str = r#"""""#;

/// Normalized reply of the remote model, in the wire shape of `/api/analyze`.
///
/// `prompt_type` is passed through as the model wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAnalysis {
    pub prompt_type: String,
    pub growth_score: Score,
    pub dependency_score: Score,
    pub short_feedback: String,
}

impl RemoteAnalysis {
    /// Converts to a classification result. Unrecognised labels become `Unknown`.
    pub fn into_result(self) -> ClassificationResult {
        ClassificationResult {
            prompt_type: PromptType::from_label(&self.prompt_type),
            growth: self.growth_score,
            dependency: self.dependency_score,
            feedback: Some(self.short_feedback),
            source: ResultSource::Remote,
        }
    }
}

/// Builds the model instruction with the prompt embedded verbatim.
pub fn build_instruction(prompt: &str) -> String {
    format!("{INSTRUCTION_PREAMBLE}\n{PROMPT_DELIMITER}{prompt}{PROMPT_DELIMITER}")
}

/// Parses the raw model output strictly as JSON and normalizes its fields.
pub fn decode_analysis(raw: &str) -> Result<RemoteAnalysis, ClassifierError> {
    let raw = raw.trim();
    let parsed: Value = serde_json::from_str(raw).map_err(|e| ClassifierError::Decode {
        message: e.to_string(),
        raw: raw.to_string(),
    })?;

    Ok(RemoteAnalysis {
        prompt_type: text_field(&parsed, "promptType").unwrap_or_else(|| "Unknown".to_string()),
        growth_score: Score::from_f64(coerce_number(parsed.get("growthScore"))),
        dependency_score: Score::from_f64(coerce_number(parsed.get("dependencyScore"))),
        short_feedback: text_field(&parsed, "shortFeedback").unwrap_or_default(),
    })
}

/// Missing and null fields are absent; non-string values keep their JSON text.
fn text_field(parsed: &Value, key: &str) -> Option<String> {
    match parsed.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Lenient numeric coercion: numbers, numeric strings and booleans count; anything else is 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// The remote classifier adapter. One request per call, no retries.
#[derive(Clone)]
pub struct RemoteClassifier {
    llm: Arc<dyn LlmActor>,
}

impl RemoteClassifier {
    pub fn new(llm: Arc<dyn LlmActor>) -> Self {
        Self { llm }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_configured()
    }

    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    pub async fn analyze(&self, prompt: &str) -> Result<RemoteAnalysis, ClassifierError> {
        if !self.llm.is_configured() {
            return Err(ClassifierError::ConfigurationMissing(
                "Gemini API key not configured on server.".to_string(),
            ));
        }

        let raw = self.llm.generate(build_instruction(prompt)).await?;
        debug!(raw = %raw, "Raw model response");

        let analysis = decode_analysis(&raw).inspect_err(|e| {
            if let ClassifierError::Decode { raw, .. } = e {
                warn!(raw = %raw, "Model response is not valid JSON");
            }
        })?;

        debug!(?analysis, "Parsed remote analysis");
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_embeds_prompt_verbatim() {
        let instruction = build_instruction("Explain \"monads\"\nplease");
        assert!(instruction.ends_with("\"\"\"Explain \"monads\"\nplease\"\"\""));
        assert!(instruction.contains("\"growthScore\": 0-100"));
        assert!(instruction.contains("Respond ONLY with valid JSON"));
    }

    #[test]
    fn test_decode_well_formed_reply() {
        let raw = r#"  {"promptType":"Creation","growthScore":72,"dependencyScore":30,"shortFeedback":"Nice."}  "#;
        let analysis = decode_analysis(raw).unwrap();
        assert_eq!(analysis.prompt_type, "Creation");
        assert_eq!(analysis.growth_score.value(), 72);
        assert_eq!(analysis.dependency_score.value(), 30);
        assert_eq!(analysis.short_feedback, "Nice.");
    }

    #[test]
    fn test_decode_applies_defaults_and_clamping() {
        let raw = r#"{"growthScore":"140","dependencyScore":"lots"}"#;
        let analysis = decode_analysis(raw).unwrap();
        assert_eq!(analysis.prompt_type, "Unknown");
        assert_eq!(analysis.growth_score, Score::MAX);
        assert_eq!(analysis.dependency_score, Score::MIN);
        assert_eq!(analysis.short_feedback, "");
    }

    #[test]
    fn test_decode_passes_through_unknown_type() {
        let raw = r#"{"promptType":"Brainstorming","growthScore":-20.4,"dependencyScore":55.5}"#;
        let analysis = decode_analysis(raw).unwrap();
        assert_eq!(analysis.prompt_type, "Brainstorming");
        assert_eq!(analysis.growth_score, Score::MIN);
        assert_eq!(analysis.dependency_score.value(), 56);

        let result = analysis.into_result();
        assert_eq!(result.prompt_type, PromptType::Unknown);
        assert_eq!(result.source, ResultSource::Remote);
    }

    #[test]
    fn test_decode_rejects_fenced_output() {
        let raw = "```json\n{\"promptType\":\"Learning\"}\n```";
        match decode_analysis(raw) {
            Err(ClassifierError::Decode { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("Expected decode failure, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_non_object_json() {
        let analysis = decode_analysis("42").unwrap();
        assert_eq!(analysis.prompt_type, "Unknown");
        assert_eq!(analysis.growth_score, Score::MIN);
    }
}
