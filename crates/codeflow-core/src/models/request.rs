//! The request record and its partial updates.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::{ExecutionResult, RequestStatus};

/// Number of automatic debug cycles a request may consume.
pub const MAX_DEBUG_ATTEMPTS: u32 = 3;

/// One user task, tracked from description to working code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodingRequest {
    /// Opaque identifier derived from the creation time
    pub id: String,

    /// Trimmed task description as the user typed it
    pub description: String,

    /// Approved (or last edited) implementation plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    /// Latest generated or debugged source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Output of the last successful execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error lines of the last failed execution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Lifecycle tag
    pub status: RequestStatus,

    /// Timestamp when the request was created (UTC)
    pub created_at: Timestamp,

    /// Automatic debug cycles consumed so far
    #[serde(default)]
    pub debug_attempts: u32,
}

impl CodingRequest {
    /// Creates a freshly submitted request in the planning state.
    pub fn new(id: impl Into<String>, description: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            plan: None,
            code: None,
            output: None,
            errors: Vec::new(),
            status: RequestStatus::Planning,
            created_at,
            debug_attempts: 0,
        }
    }

    /// Applies an execution outcome.
    ///
    /// Success clears the error list and failure clears the output, so the
    /// two are never observed together.
    pub fn record_execution(&mut self, result: &ExecutionResult) {
        match result {
            ExecutionResult::Success { output } => {
                self.output = Some(output.clone());
                self.errors.clear();
            }
            ExecutionResult::Failure { errors } => {
                self.output = None;
                self.errors = errors.clone();
            }
        }
    }

    /// Whether another automatic debug cycle is allowed.
    pub fn can_debug(&self) -> bool {
        self.debug_attempts < MAX_DEBUG_ATTEMPTS
    }

    /// Debug cycles left before manual review is required.
    pub fn remaining_debug_attempts(&self) -> u32 {
        MAX_DEBUG_ATTEMPTS.saturating_sub(self.debug_attempts)
    }

    /// Time elapsed between creation and `now`.
    pub fn elapsed(&self, now: Timestamp) -> SignedDuration {
        now.duration_since(self.created_at)
    }
}

/// A request as held by the store, with its owner and last write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRequest {
    /// Owner of the request
    pub user_id: String,

    /// Timestamp of the last update (UTC)
    pub updated_at: Timestamp,

    /// The request itself
    #[serde(flatten)]
    pub request: CodingRequest,
}

/// Partial update of a stored request.
///
/// `None` leaves a column untouched. `output` is doubly optional because a
/// failed execution must clear it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestUpdate {
    pub plan: Option<String>,
    pub code: Option<String>,
    pub output: Option<Option<String>>,
    pub errors: Option<Vec<String>>,
    pub status: Option<RequestStatus>,
    pub debug_attempts: Option<u32>,
}

impl RequestUpdate {
    /// Update that only changes the status.
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Update that writes every mutable field of `request`.
    pub fn snapshot(request: &CodingRequest) -> Self {
        Self {
            plan: request.plan.clone(),
            code: request.code.clone(),
            output: Some(request.output.clone()),
            errors: Some(request.errors.clone()),
            status: Some(request.status),
            debug_attempts: Some(request.debug_attempts),
        }
    }

    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.plan.is_none()
            && self.code.is_none()
            && self.output.is_none()
            && self.errors.is_none()
            && self.status.is_none()
            && self.debug_attempts.is_none()
    }
}
