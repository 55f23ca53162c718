//! Session batch analysis.
//!
//! A pasted conversation is split into prompt lines and every line is scored by
//! the local heuristic. The remote model is never called here. Each completed
//! analysis counts against the daily quota.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::brain::{ClassificationResult, HeuristicClassifier, PromptType, Score};
use crate::error::AppError;
use crate::quota::{DailyQuota, QuotaStatus};

/// One analyzed line of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub id: Uuid,
    /// The trimmed line.
    pub text: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
}

/// Per-line results plus aggregates, recomputed from scratch for each submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBatchResult {
    pub items: Vec<SessionItem>,
    pub mean_growth: Score,
    pub mean_dependency: Score,
    pub type_counts: BTreeMap<PromptType, usize>,
}

impl SessionBatchResult {
    /// Classifies each line independently, preserving order.
    pub fn from_lines<'a, I>(classifier: &HeuristicClassifier, lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let items: Vec<SessionItem> = lines
            .into_iter()
            .map(|line| SessionItem {
                id: Uuid::new_v4(),
                text: line.to_string(),
                result: classifier.classify(line),
            })
            .collect();

        let mut type_counts = BTreeMap::new();
        for item in &items {
            *type_counts.entry(item.result.prompt_type).or_insert(0) += 1;
        }

        Self {
            mean_growth: Score::mean(items.iter().map(|i| i.result.growth)),
            mean_dependency: Score::mean(items.iter().map(|i| i.result.dependency)),
            type_counts,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A batch result together with the quota left after it was counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub batch: SessionBatchResult,
    pub quota: QuotaStatus,
}

/// Splits pasted text into trimmed, non-empty lines. Handles `\n` and `\r\n`.
pub fn split_prompt_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Session batch orchestrator.
pub struct SessionAnalyzer {
    classifier: HeuristicClassifier,
    quota: DailyQuota,
    // Serializes the check-analyze-increment sequence.
    gate: Mutex<()>,
}

impl SessionAnalyzer {
    pub fn new(quota: DailyQuota) -> Self {
        Self {
            classifier: HeuristicClassifier::new(),
            quota,
            gate: Mutex::new(()),
        }
    }

    pub async fn quota_status(&self) -> Result<QuotaStatus, AppError> {
        self.quota.status().await
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn analyze(&self, text: &str) -> Result<SessionReport, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation(
                "Paste some conversation or prompts first.".to_string(),
            ));
        }

        let _guard = self.gate.lock().await;

        self.quota.ensure_available().await?;

        let lines = split_prompt_lines(text);
        if lines.is_empty() {
            return Err(AppError::EmptySession);
        }

        let batch = SessionBatchResult::from_lines(&self.classifier, lines);
        let quota = self.quota.record_use().await?;

        info!(
            prompts = batch.len(),
            mean_growth = %batch.mean_growth,
            mean_dependency = %batch.mean_dependency,
            remaining = quota.remaining,
            "Session analyzed"
        );

        Ok(SessionReport { batch, quota })
    }
}
