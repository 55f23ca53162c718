//! # Brain Module
//!
//! Prompt classification without a model call.
//!
//! ## Components
//! - `classification`: result types shared with the remote path
//! - `heuristic`: keyword-signal classifier (offline fallback and batch analysis)

pub mod classification;
pub mod heuristic;

pub use classification::{ClassificationResult, PromptType, ResultSource, Score};
pub use heuristic::{HeuristicClassifier, Signals, OFFLINE_FEEDBACK};
