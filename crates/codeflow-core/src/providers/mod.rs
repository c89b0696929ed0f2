//! Generation and execution providers.
//!
//! The workflow talks to two external collaborators through the traits in
//! this module:
//!
//! - [`GenerationProvider`] turns a description into a plan, code, debug
//!   revisions, an explanation, and a follow-up question.
//! - [`ExecutionProvider`] runs (or pretends to run) the generated code.
//!
//! Every call is a single request/response: no streaming, no partial
//! results, no cancellation once issued, and no retry. Determinism is not
//! part of the contract.
//!
//! ## Implementations
//!
//! | Provider | Kind | Notes |
//! |---|---|---|
//! | [`TemplateGenerator`] | generation | category templates with artificial latency |
//! | [`GeminiGenerator`] | generation | pass-through to the hosted Gemini API |
//! | [`SimulatedExecutor`] | execution | seeded coin flip plus source inspection |

use async_trait::async_trait;

use crate::{
    error::ProviderError,
    models::{ExecutionResult, FollowUpResult},
};

mod executor;
mod gemini;
mod mock;
pub mod templates;

pub use executor::SimulatedExecutor;
pub use gemini::{GeminiConfig, GeminiGenerator, API_KEY_VAR};
pub use mock::TemplateGenerator;
pub use templates::Category;

/// Text generation collaborator.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Produces an implementation plan for a task description.
    async fn generate_plan(&self, description: &str) -> Result<String, ProviderError>;

    /// Produces source code implementing `plan`.
    async fn generate_code(&self, description: &str, plan: &str) -> Result<String, ProviderError>;

    /// Produces a revision of `code` addressing `errors`.
    ///
    /// The revision may be identical to the input.
    async fn debug_code(&self, code: &str, errors: &[String]) -> Result<String, ProviderError>;

    /// Explains what the finished code does.
    async fn generate_explanation(
        &self,
        description: &str,
        code: &str,
    ) -> Result<String, ProviderError>;

    /// Suggests next steps for the finished project.
    async fn generate_follow_up_question(
        &self,
        description: &str,
        code: &str,
    ) -> Result<String, ProviderError>;

    /// Generates the explanation and the follow-up question concurrently.
    ///
    /// Both halves always run to completion and report their own outcome.
    async fn generate_follow_up(&self, description: &str, code: &str) -> FollowUpResult {
        let (explanation, question) = tokio::join!(
            self.generate_explanation(description, code),
            self.generate_follow_up_question(description, code),
        );
        FollowUpResult {
            explanation,
            question,
        }
    }
}

/// Code execution collaborator.
///
/// A failed program is a normal [`ExecutionResult::Failure`]; `Err` is
/// reserved for the provider itself being unavailable.
#[async_trait]
pub trait ExecutionProvider: Send + Sync {
    /// Runs `code` once.
    async fn execute_code(&self, code: &str) -> Result<ExecutionResult, ProviderError>;
}
