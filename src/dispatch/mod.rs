//! Command dispatch surfaces
//!
//! Two executors share one business-operation layer: the local executor
//! matches raw transcripts against a dense regex ruleset, the structured
//! executor runs intents resolved by the pattern table. Both report through
//! [`Feedback`], which pairs exactly one spoken confirmation with exactly
//! one visual toast per dispatched command.

mod local;
mod structured;

pub use local::LocalExecutor;
pub use structured::StructuredExecutor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::commerce::ActionOutcome;

/// Fixed reply for input no rule recognizes
pub(crate) const NOT_UNDERSTOOD: &str =
    "Sorry, I didn't catch that. Say help to hear what you can say.";

/// Something that can speak a confirmation aloud
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Speak `text`, cancelling any in-progress utterance
    async fn announce(&self, text: &str) -> Result<()>;
}

/// A visual notification mirrored alongside speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Whether the command succeeded
    pub success: bool,
    /// Toast body
    pub message: String,
}

/// Pairs the spoken and visual channels at the dispatch boundary
pub struct Feedback {
    announcer: Arc<dyn Announcer>,
    toast_tx: tokio::sync::mpsc::UnboundedSender<Toast>,
}

impl Feedback {
    /// Create a feedback sink
    #[must_use]
    pub fn new(
        announcer: Arc<dyn Announcer>,
        toast_tx: tokio::sync::mpsc::UnboundedSender<Toast>,
    ) -> Self {
        Self {
            announcer,
            toast_tx,
        }
    }

    /// Report an outcome: one toast, one spoken confirmation.
    ///
    /// Speech failure is logged, never propagated; the toast already
    /// carried the message.
    pub async fn report(&self, outcome: &ActionOutcome) {
        let _ = self.toast_tx.send(Toast {
            success: outcome.success,
            message: outcome.message.clone(),
        });
        if let Err(e) = self.announcer.announce(&outcome.message).await {
            tracing::warn!(error = %e, "failed to speak confirmation");
        }
    }
}
