//! Data models for coding requests and workflow positions.
//!
//! The workflow threads a single record, [`CodingRequest`], through every
//! step. Each step fills in more of it: the plan on approval, the code on
//! generation and every debug cycle, and the output or error list on every
//! execution. The coarse position in the workflow lives in
//! [`WorkflowStep`]; [`RequestStatus`] is the lifecycle tag persisted with
//! the record.
//!
//! # Display Architecture
//!
//! Models implement [`std::fmt::Display`] as markdown in
//! [`crate::display`], so the same record can be printed by the CLI
//! renderer or logged as plain text.
//!
//! # Examples
//!
//! ```rust
//! use codeflow_core::models::{CodingRequest, ExecutionResult, RequestStatus};
//! use jiff::Timestamp;
//!
//! let mut request = CodingRequest::new("1", "Build a CSV analysis script", Timestamp::now());
//! assert_eq!(request.status, RequestStatus::Planning);
//!
//! request.record_execution(&ExecutionResult::Failure {
//!     errors: vec!["NameError: name 'main' is not defined".to_string()],
//! });
//! assert!(request.output.is_none());
//! assert_eq!(request.errors.len(), 1);
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

mod outcome;
mod request;

pub use outcome::{ExecutionResult, FollowUpResult};
pub use request::{CodingRequest, RequestUpdate, StoredRequest, MAX_DEBUG_ATTEMPTS};

/// Lifecycle tag stored with every request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Created but not yet planned
    #[default]
    Pending,

    /// Waiting for or reviewing the implementation plan
    Planning,

    /// Plan approved, code being generated or revised
    Coding,

    /// An execution attempt is in flight
    Executing,

    /// Code ran successfully and the user moved on
    Completed,

    /// The last execution attempt failed
    Error,
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "planning" => Ok(RequestStatus::Planning),
            "coding" => Ok(RequestStatus::Coding),
            "executing" => Ok(RequestStatus::Executing),
            "completed" => Ok(RequestStatus::Completed),
            "error" => Ok(RequestStatus::Error),
            _ => Err(format!("Invalid request status: {s}")),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RequestStatus {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Planning => "planning",
            RequestStatus::Coding => "coding",
            RequestStatus::Executing => "executing",
            RequestStatus::Completed => "completed",
            RequestStatus::Error => "error",
        }
    }

    /// Get status with an icon for list display.
    ///
    /// ```rust
    /// use codeflow_core::models::RequestStatus;
    ///
    /// assert_eq!(RequestStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(RequestStatus::Error.with_icon(), "✗ Error");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "○ Pending",
            RequestStatus::Planning => "◇ Planning",
            RequestStatus::Coding => "➤ Coding",
            RequestStatus::Executing => "⟳ Executing",
            RequestStatus::Completed => "✓ Completed",
            RequestStatus::Error => "✗ Error",
        }
    }
}

/// Position in the describe → plan → code → follow-up workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    /// Waiting for a task description
    #[default]
    Request,

    /// Reviewing, editing, or approving the generated plan
    Plan,

    /// Generating, running, and debugging code
    Code,

    /// Reading the explanation and follow-up suggestions
    FollowUp,
}

impl WorkflowStep {
    /// All steps in workflow order.
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Request,
        WorkflowStep::Plan,
        WorkflowStep::Code,
        WorkflowStep::FollowUp,
    ];

    /// Short machine name, also used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Request => "request",
            WorkflowStep::Plan => "plan",
            WorkflowStep::Code => "code",
            WorkflowStep::FollowUp => "follow-up",
        }
    }

    /// Title shown in the step indicator.
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStep::Request => "Request",
            WorkflowStep::Plan => "Plan",
            WorkflowStep::Code => "Code",
            WorkflowStep::FollowUp => "Follow-up",
        }
    }

    /// Zero-based position in [`WorkflowStep::ALL`].
    pub fn index(&self) -> usize {
        match self {
            WorkflowStep::Request => 0,
            WorkflowStep::Plan => 1,
            WorkflowStep::Code => 2,
            WorkflowStep::FollowUp => 3,
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
