//! Test Module
//!
//! Test suite for the PromptLens backend.
//!
//! ## Test Categories
//! - `brain_tests`: heuristic classification properties and scenarios
//! - `actor_tests`: remote classifier and supervisor fallback behavior
//! - `session_tests`: batch analysis, daily quota and the SQLite usage store
//! - `server_tests`: HTTP routes end to end
