use crate::actors::messages::ClassifierError;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the text-generation backend so the classifier can be
/// driven by the Gemini actor in production and by mocks in tests.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Sends one instruction and returns the raw completion text.
    async fn generate(&self, instruction: String) -> Result<String, ClassifierError>;

    /// Whether the backend has what it needs to attempt a request.
    fn is_configured(&self) -> bool {
        true
    }
}
