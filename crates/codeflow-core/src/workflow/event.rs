//! Messages into the controller and the work it asks for in return.

use crate::{
    error::ProviderError,
    models::{CodingRequest, ExecutionResult, RequestUpdate},
};

use super::Ticket;

/// Input to [`super::Controller::handle`].
///
/// The first group are user intents sent by the step panels. The second
/// group are completions of calls the controller issued earlier; each
/// carries the [`Ticket`] of the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start a new request from a task description
    Submit { description: String },
    /// Replace the working plan text
    EditPlan { text: String },
    /// Accept the working plan and move on to code
    Approve,
    /// Return to the previous step
    Back,
    /// Run the current code
    Execute,
    /// Ask for a revision of failing code
    Debug,
    /// Finish the code step after a successful run
    Complete,
    /// Drop the finished request and start over
    NewRequest,
    /// Re-issue the call that failed in the current step
    Retry,
    /// Reply to the follow-up suggestions
    Respond { text: String },

    PlanGenerated {
        ticket: Ticket,
        result: Result<String, ProviderError>,
    },
    CodeGenerated {
        ticket: Ticket,
        result: Result<String, ProviderError>,
    },
    Executed {
        ticket: Ticket,
        result: Result<ExecutionResult, ProviderError>,
    },
    Debugged {
        ticket: Ticket,
        result: Result<String, ProviderError>,
    },
    /// `None` marks a half that was not requested
    FollowUpGenerated {
        ticket: Ticket,
        explanation: Option<Result<String, ProviderError>>,
        question: Option<Result<String, ProviderError>>,
    },
}

impl Event {
    /// Short verb phrase used in transition errors.
    pub fn action(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit a request",
            Event::EditPlan { .. } => "edit the plan",
            Event::Approve => "approve the plan",
            Event::Back => "go back",
            Event::Execute => "execute code",
            Event::Debug => "debug code",
            Event::Complete => "complete the code step",
            Event::NewRequest => "start a new request",
            Event::Retry => "retry",
            Event::Respond { .. } => "respond",
            Event::PlanGenerated { .. } => "accept a plan",
            Event::CodeGenerated { .. } => "accept code",
            Event::Executed { .. } => "accept an execution result",
            Event::Debugged { .. } => "accept a revision",
            Event::FollowUpGenerated { .. } => "accept a follow-up",
        }
    }

    /// The ticket of a completion event.
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Event::PlanGenerated { ticket, .. }
            | Event::CodeGenerated { ticket, .. }
            | Event::Executed { ticket, .. }
            | Event::Debugged { ticket, .. }
            | Event::FollowUpGenerated { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }
}

/// Work requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    GeneratePlan {
        ticket: Ticket,
        description: String,
    },
    GenerateCode {
        ticket: Ticket,
        description: String,
        plan: String,
    },
    /// `after_debug` asks the runner to pause before running a revision
    Execute {
        ticket: Ticket,
        code: String,
        after_debug: bool,
    },
    Debug {
        ticket: Ticket,
        code: String,
        errors: Vec<String>,
    },
    GenerateFollowUp {
        ticket: Ticket,
        description: String,
        code: String,
        explanation: bool,
        question: bool,
    },
    Persist(Persist),
}

impl Effect {
    /// The ticket the completion must carry; `None` for store writes.
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Effect::GeneratePlan { ticket, .. }
            | Effect::GenerateCode { ticket, .. }
            | Effect::Execute { ticket, .. }
            | Effect::Debug { ticket, .. }
            | Effect::GenerateFollowUp { ticket, .. } => Some(*ticket),
            Effect::Persist(_) => None,
        }
    }
}

/// Store writes. These have no completion event.
#[derive(Debug, Clone, PartialEq)]
pub enum Persist {
    Create {
        user_id: String,
        request: CodingRequest,
    },
    Update {
        id: String,
        update: RequestUpdate,
    },
}
