use crate::actors::messages::{AppError, SupervisorMessage};
use crate::actors::remote::RemoteClassifier;
use crate::brain::{ClassificationResult, HeuristicClassifier};
use crate::history::{HistoryEntry, HistorySnapshot, PromptOutcome, SessionHistory};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{info, instrument, warn};

/// Upper bound for a reply from the history actor. It never waits on the network.
const HISTORY_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A handle to the `SupervisorActor`.
///
/// Classification runs on the caller's task, so concurrent prompts reach the
/// model in parallel. The actor only owns the history: records and reads are
/// applied one at a time in arrival order.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    remote: RemoteClassifier,
    heuristic: HeuristicClassifier,
    remote_timeout: Duration,
}

impl SupervisorHandle {
    /// Spawns the supervisor actor.
    ///
    /// # Arguments
    ///
    /// * `remote` - Remote classifier tried first for every prompt.
    /// * `remote_timeout` - Upper bound of one remote call. Expiry falls back to the heuristic.
    pub fn new(remote: RemoteClassifier, remote_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner::new(receiver);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            remote,
            heuristic: HeuristicClassifier::new(),
            remote_timeout,
        }
    }

    /// Classifies one prompt and records it in the history.
    ///
    /// 1. Rejects blank input without touching the history.
    /// 2. Tries the remote classifier within `remote_timeout`.
    /// 3. Falls back to the local heuristic on any remote failure.
    /// 4. Prepends a history entry and returns the refreshed statistics.
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    pub async fn analyze_prompt(&self, prompt: String) -> Result<PromptOutcome, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::Validation("Please enter a prompt first.".to_string()));
        }

        let result = self.classify(&prompt).await;
        let entry = HistoryEntry::new(prompt, &result);

        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::Record {
            entry: entry.clone(),
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let stats = timeout(HISTORY_REPLY_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        info!(
            prompt_type = %result.prompt_type,
            source = ?result.source,
            history = stats.count,
            "Prompt analyzed"
        );

        Ok(PromptOutcome {
            result,
            entry,
            stats,
        })
    }

    /// Returns a copy of the history with aggregate statistics.
    pub async fn history(&self) -> Result<HistorySnapshot, AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(SupervisorMessage::GetHistory { responder: send })
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        timeout(HISTORY_REPLY_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn classify(&self, prompt: &str) -> ClassificationResult {
        match timeout(self.remote_timeout, self.remote.analyze(prompt)).await {
            Ok(Ok(analysis)) => analysis.into_result(),
            Ok(Err(e)) => {
                warn!(error = %e, "Remote analysis unavailable, falling back to local heuristic");
                self.heuristic.classify_offline(prompt)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.remote_timeout.as_secs_f64(),
                    "Remote analysis timed out, falling back to local heuristic"
                );
                self.heuristic.classify_offline(prompt)
            }
        }
    }
}

// --- Actor Runner ---
struct SupervisorRunner {
    receiver: mpsc::Receiver<SupervisorMessage>,
    history: SessionHistory,
}

impl SupervisorRunner {
    fn new(receiver: mpsc::Receiver<SupervisorMessage>) -> Self {
        Self {
            receiver,
            history: SessionHistory::new(),
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }
        info!("Supervisor stopped");
    }

    fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::Record { entry, responder } => {
                self.history.record(entry);
                let _ = responder.send(self.history.stats());
            }
            SupervisorMessage::GetHistory { responder } => {
                let _ = responder.send(self.history.snapshot());
            }
        }
    }
}
