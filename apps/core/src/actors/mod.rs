//! Actor system: the Gemini-backed LLM actor, the remote classifier built on it,
//! and the supervisor that orchestrates single-prompt analysis.

pub mod llm;
pub mod messages;
pub mod remote;
pub mod supervisor;
pub mod traits;

pub use llm::{GeminiSettings, LlmActorHandle};
pub use messages::ClassifierError;
pub use remote::{RemoteAnalysis, RemoteClassifier};
pub use supervisor::SupervisorHandle;
pub use traits::LlmActor;
