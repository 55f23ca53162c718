use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::brain::{ClassificationResult, PromptType, ResultSource, Score};

/// One classified prompt, as shown in the playground history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    /// The prompt as the user typed it.
    pub text: String,
    pub prompt_type: PromptType,
    pub growth: Score,
    pub dependency: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub source: ResultSource,
    pub created_at: DateTime<Utc>,
    /// Local wall-clock time, `HH:MM:SS`.
    pub display_time: String,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, result: &ClassificationResult) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            prompt_type: result.prompt_type,
            growth: result.growth,
            dependency: result.dependency,
            feedback: result.feedback.clone(),
            source: result.source,
            created_at,
            display_time: created_at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        }
    }
}

/// Mean scores over the whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub count: usize,
    pub mean_growth: Score,
    pub mean_dependency: Score,
}

/// In-memory prompt history for the lifetime of the process, most recent first.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Recomputed over the full list on every call.
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            count: self.entries.len(),
            mean_growth: Score::mean(self.entries.iter().map(|e| e.growth)),
            mean_dependency: Score::mean(self.entries.iter().map(|e| e.dependency)),
        }
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            entries: self.entries.iter().cloned().collect(),
            stats: self.stats(),
        }
    }
}

/// Copy of the history handed out to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub entries: Vec<HistoryEntry>,
    pub stats: HistoryStats,
}

/// Result of a single-prompt analysis: the classification, the entry recorded, and the new stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOutcome {
    pub result: ClassificationResult,
    pub entry: HistoryEntry,
    pub stats: HistoryStats,
}
