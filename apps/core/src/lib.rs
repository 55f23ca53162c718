//! # PromptLens Core
//!
//! Classifies prompts written for AI assistants as Learning, Delegation,
//! Creation, Trivial or Mixed and scores how much each one grows the user's
//! own thinking versus how much it offloads it.
//!
//! The remote path asks a Gemini model; the local heuristic in [`brain`] is
//! the fallback for single prompts and the only classifier for batch sessions.

pub mod actors;
pub mod brain;
pub mod config;
pub mod database;
pub mod error;
pub mod history;
pub mod quota;
pub mod server;
pub mod session;

#[cfg(test)]
mod tests;
