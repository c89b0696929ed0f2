//! Provider call outcomes carried by the request model.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Result of one (simulated) execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// The program ran and printed `output`
    Success { output: String },

    /// The program failed; `errors` lists the messages in order
    Failure { errors: Vec<String> },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }
}

/// Explanation and follow-up question, each with its own outcome.
///
/// The two halves are generated together but may fail independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpResult {
    pub explanation: Result<String, ProviderError>,
    pub question: Result<String, ProviderError>,
}

impl FollowUpResult {
    /// Both halves succeeded.
    pub fn is_complete(&self) -> bool {
        self.explanation.is_ok() && self.question.is_ok()
    }
}
