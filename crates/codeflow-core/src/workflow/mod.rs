//! The four-step request workflow.
//!
//! ```text
//! Request ──submit──▶ Plan ──approve──▶ Code ──complete──▶ Follow-up
//!    ▲                 │ ▲               │                    │
//!    └──────back───────┘ └─────back──────┘                    │
//!    ▲                                                        │
//!    └────────────────────────new request─────────────────────┘
//! ```
//!
//! [`Controller`] is a synchronous reducer: it turns an [`Event`] into state
//! changes plus a list of [`Effect`]s. [`WorkflowRunner`] performs those
//! effects against the providers and the store and feeds the completions
//! back. Callers that want to schedule effects themselves can drive the
//! controller directly; every completion carries the [`Ticket`] of the call
//! it answers, and completions for an abandoned step are ignored.
//!
//! # Examples
//!
//! ```rust
//! use codeflow_core::{
//!     models::WorkflowStep,
//!     session::Session,
//!     workflow::{Controller, Effect, Event},
//! };
//!
//! let mut controller = Controller::new(Session::signed_in("alice").unwrap());
//! let effects = controller
//!     .handle(Event::Submit { description: "Sort my photos".into() })
//!     .unwrap();
//!
//! assert_eq!(controller.step(), WorkflowStep::Plan);
//! assert!(matches!(effects[1], Effect::GeneratePlan { .. }));
//! ```

mod controller;
mod event;
mod runner;
mod state;

#[cfg(test)]
mod tests;

pub use controller::Controller;
pub use event::{Effect, Event, Persist};
pub use runner::WorkflowRunner;
pub use state::{FollowUpState, Half, Stage, StepFailure, Ticket};
