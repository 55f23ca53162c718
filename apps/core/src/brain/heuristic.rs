//! Offline prompt classification using keyword signals.
//!
//! Used as the fallback when the remote model is unavailable and as the
//! only classifier for batch session analysis. Pure: the same text always
//! yields the same result.

use regex::Regex;
use std::sync::LazyLock;

use super::classification::{ClassificationResult, PromptType, ResultSource, Score};

/// Feedback attached to single-prompt results produced by this classifier.
pub const OFFLINE_FEEDBACK: &str =
    "Using offline heuristic analysis because the AI analysis is not available right now.";

const LEARNING_PHRASES: &[&str] = &["explain", "why", "how does", "teach me", "help me understand"];

const DELEGATION_PHRASES: &[&str] = &[
    "write full",
    "write an essay",
    "do this for me",
    "generate complete",
    "solve this for me",
];

const CREATION_PHRASES: &[&str] = &["improve my", "review my", "refactor", "critique", "polish"];

/// Prompts with at most this many space-separated tokens count as trivial.
const TRIVIAL_MAX_TOKENS: usize = 4;
const LONG_PROMPT_MIN_WORDS: usize = 21;
const SHORT_PROMPT_MAX_WORDS: usize = 5;
const LENGTH_ADJUSTMENT: i64 = 5;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Keyword signals detected in a prompt. Each is 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub learning: u8,
    pub delegation: u8,
    pub creation: u8,
    pub trivial: u8,
}

impl Signals {
    /// Detects signals in already lower-cased text.
    pub fn detect(lower: &str) -> Self {
        Self {
            learning: contains_any(lower, LEARNING_PHRASES),
            delegation: contains_any(lower, DELEGATION_PHRASES),
            creation: contains_any(lower, CREATION_PHRASES),
            trivial: u8::from(space_token_count(lower) <= TRIVIAL_MAX_TOKENS),
        }
    }

    /// Picks the winning type. Ties resolve learning > delegation > creation > trivial.
    pub fn winner(&self) -> PromptType {
        let ranked = [
            (self.learning, PromptType::Learning),
            (self.delegation, PromptType::Delegation),
            (self.creation, PromptType::Creation),
            (self.trivial, PromptType::Trivial),
        ];
        let max = ranked.iter().map(|(v, _)| *v).max().unwrap_or(0);

        ranked
            .into_iter()
            .find(|(v, _)| *v == max && *v > 0)
            .map(|(_, t)| t)
            .unwrap_or(PromptType::Mixed)
    }
}

fn contains_any(text: &str, phrases: &[&str]) -> u8 {
    u8::from(phrases.iter().any(|p| text.contains(p)))
}

/// Token count from splitting on single spaces. Consecutive spaces yield empty tokens.
fn space_token_count(text: &str) -> usize {
    text.split(' ').count()
}

/// Token count from splitting on runs of any whitespace.
fn word_count(text: &str) -> usize {
    WHITESPACE_RUN.split(text).count()
}

fn base_scores(prompt_type: PromptType) -> (i64, i64) {
    match prompt_type {
        PromptType::Learning => (85, 20),
        PromptType::Creation => (75, 35),
        PromptType::Delegation => (35, 80),
        PromptType::Trivial => (20, 60),
        PromptType::Mixed | PromptType::Unknown => (50, 50),
    }
}

/// Keyword-based classifier producing growth and dependency scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a prompt. Never fails; the result carries no feedback text.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lower = text.trim().to_lowercase();
        let prompt_type = Signals::detect(&lower).winner();
        let (mut growth, mut dependency) = base_scores(prompt_type);

        let words = word_count(&lower);
        if words >= LONG_PROMPT_MIN_WORDS {
            growth += LENGTH_ADJUSTMENT;
            dependency -= LENGTH_ADJUSTMENT;
        } else if words <= SHORT_PROMPT_MAX_WORDS {
            growth -= LENGTH_ADJUSTMENT;
            dependency += LENGTH_ADJUSTMENT;
        }

        ClassificationResult {
            prompt_type,
            growth: Score::clamped(growth),
            dependency: Score::clamped(dependency),
            feedback: None,
            source: ResultSource::Local,
        }
    }

    /// Classify a single prompt and attach the offline-analysis notice.
    pub fn classify_offline(&self, text: &str) -> ClassificationResult {
        self.classify(text).with_feedback(OFFLINE_FEEDBACK)
    }
}
