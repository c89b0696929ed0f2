//! Read-only pieces of controller state shown by the step panels.

use std::fmt;

use crate::error::ProviderError;

/// Stamp attached to every issued call.
///
/// A completion is applied only while the controller is still in the epoch
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub(crate) epoch: u64,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Provider call kinds the controller can be waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Plan,
    Code,
    Execution,
    Debug,
    FollowUp,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plan => "plan generation",
            Stage::Code => "code generation",
            Stage::Execution => "execution",
            Stage::Debug => "debugging",
            Stage::FollowUp => "follow-up generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected provider call, kept until the user retries or leaves the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// One half of the follow-up panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Half {
    #[default]
    Pending,
    Ready(String),
    Failed(ProviderError),
}

impl Half {
    pub fn text(&self) -> Option<&str> {
        match self {
            Half::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Half::Failed(_))
    }

    pub(crate) fn from_result(result: Result<String, ProviderError>) -> Self {
        match result {
            Ok(text) => Half::Ready(text),
            Err(err) => Half::Failed(err),
        }
    }
}

/// Explanation, suggested next steps, and the user's replies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowUpState {
    pub explanation: Half,
    pub question: Half,
    pub replies: Vec<String>,
}

impl FollowUpState {
    /// Error text of every failed half, joined for display.
    pub(crate) fn failure_message(&self) -> Option<String> {
        let messages: Vec<String> = [
            ("explanation", &self.explanation),
            ("follow-up question", &self.question),
        ]
        .into_iter()
        .filter_map(|(label, half)| match half {
            Half::Failed(err) => Some(format!("{label}: {err}")),
            _ => None,
        })
        .collect();

        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}
