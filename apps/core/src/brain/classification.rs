//! Classification output types shared by the local heuristic and the remote model path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of prompt intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PromptType {
    /// The user wants to understand something.
    Learning,
    /// The user hands the whole task over to the model.
    Delegation,
    /// The user asks for feedback on their own work.
    Creation,
    /// Very short, low-effort prompt.
    Trivial,
    /// No signal fired.
    Mixed,
    /// Label returned by the remote model that is not one of the five above.
    Unknown,
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl PromptType {
    /// The five values a classification is expected to produce.
    pub const CANONICAL: [PromptType; 5] = [
        PromptType::Learning,
        PromptType::Delegation,
        PromptType::Creation,
        PromptType::Trivial,
        PromptType::Mixed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PromptType::Learning => "Learning",
            PromptType::Delegation => "Delegation",
            PromptType::Creation => "Creation",
            PromptType::Trivial => "Trivial",
            PromptType::Mixed => "Mixed",
            PromptType::Unknown => "Unknown",
        }
    }

    /// Maps a free-form label to a prompt type. Anything unrecognised becomes `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::CANONICAL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label))
            .unwrap_or(PromptType::Unknown)
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, PromptType::Unknown)
    }
}

/// Integer score in `[0, 100]`. Construction always saturates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    pub fn clamped(value: i64) -> Self {
        Score(value.clamp(0, 100) as u8)
    }

    /// Rounds to the nearest integer before clamping. NaN maps to 0.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Score::MIN;
        }
        Score(value.clamp(0.0, 100.0).round() as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Adds a signed delta and saturates at the bounds.
    pub fn adjust(self, delta: i64) -> Self {
        Self::clamped(i64::from(self.0) + delta)
    }

    /// Arithmetic mean rounded to the nearest integer, 0 for an empty input.
    pub fn mean<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Score>,
    {
        let (sum, count) = scores
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s.0), count + 1));
        if count == 0 {
            return Score::MIN;
        }
        Self::from_f64(sum as f64 / count as f64)
    }
}

impl From<i64> for Score {
    fn from(value: i64) -> Self {
        Score::clamped(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Remote,
    Local,
}

/// Outcome of classifying one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub prompt_type: PromptType,
    pub growth: Score,
    pub dependency: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub source: ResultSource,
}

impl ClassificationResult {
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_saturates() {
        assert_eq!(Score::clamped(-3), Score::MIN);
        assert_eq!(Score::clamped(103), Score::MAX);
        assert_eq!(Score::clamped(42).value(), 42);
        assert_eq!(Score::clamped(98).adjust(5), Score::MAX);
        assert_eq!(Score::clamped(2).adjust(-5), Score::MIN);
    }

    #[test]
    fn test_score_from_f64() {
        assert_eq!(Score::from_f64(f64::NAN), Score::MIN);
        assert_eq!(Score::from_f64(f64::INFINITY), Score::MAX);
        assert_eq!(Score::from_f64(84.5).value(), 85);
        assert_eq!(Score::from_f64(-12.0), Score::MIN);
    }

    #[test]
    fn test_score_mean() {
        assert_eq!(Score::mean(Vec::<Score>::new()), Score::MIN);
        let scores = [15, 90, 50].map(Score::clamped);
        // 155 / 3 = 51.67
        assert_eq!(Score::mean(scores).value(), 52);
        let scores = [20, 25].map(Score::clamped);
        assert_eq!(Score::mean(scores).value(), 23);
    }

    #[test]
    fn test_score_deserialize_clamps() {
        let score: Score = serde_json::from_str("250").unwrap();
        assert_eq!(score, Score::MAX);
        let score: Score = serde_json::from_str("-7").unwrap();
        assert_eq!(score, Score::MIN);
        assert_eq!(serde_json::to_string(&Score::clamped(64)).unwrap(), "64");
    }

    #[test]
    fn test_prompt_type_from_label() {
        assert_eq!(PromptType::from_label("Learning"), PromptType::Learning);
        assert_eq!(PromptType::from_label(" delegation "), PromptType::Delegation);
        assert_eq!(PromptType::from_label("Mixed / Neutral"), PromptType::Unknown);
        assert_eq!(PromptType::from_label(""), PromptType::Unknown);
        assert!(!PromptType::Unknown.is_canonical());
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = ClassificationResult {
            prompt_type: PromptType::Trivial,
            growth: Score::clamped(15),
            dependency: Score::clamped(65),
            feedback: None,
            source: ResultSource::Local,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["promptType"], "Trivial");
        assert_eq!(json["growth"], 15);
        assert_eq!(json["source"], "local");
        assert!(json.get("feedback").is_none());
    }
}
