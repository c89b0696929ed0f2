//! Core library for the Codeflow coding assistant.
//!
//! Codeflow walks a task through four steps: describe it, review a generated
//! implementation plan, generate and run code (debugging failed runs a few
//! times), then read an explanation with suggested next steps. This crate
//! holds everything except the terminal front end:
//!
//! - [`models`]: the request record threaded through the workflow
//! - [`providers`]: text generation (templates or Gemini) and simulated
//!   execution
//! - [`store`]: per-user persistence in SQLite
//! - [`workflow`]: the step state machine and its async runner
//! - [`session`]: the signed-in user
//!
//! # Display Architecture
//!
//! Models implement [`std::fmt::Display`] as markdown (see [`display`]), so
//! the CLI renders the same text it would log.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use codeflow_core::{
//!     providers::{SimulatedExecutor, TemplateGenerator},
//!     store::MemoryStore,
//!     workflow::{Event, WorkflowRunner},
//!     Session, WorkflowConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkflowConfig::instant();
//! let mut runner = WorkflowRunner::new(
//!     Session::signed_in("alice")?,
//!     Arc::new(TemplateGenerator::new(&config)),
//!     Arc::new(SimulatedExecutor::new(&config)),
//!     Arc::new(MemoryStore::new()),
//!     config,
//! );
//!
//! runner
//!     .dispatch(Event::Submit { description: "Build a web scraper".into() })
//!     .await?;
//! println!("{}", runner.controller().draft_plan().unwrap_or_default());
//!
//! runner.dispatch(Event::Approve).await?;
//! runner.dispatch(Event::Execute).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod providers;
pub mod session;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use config::WorkflowConfig;
pub use db::Database;
pub use display::{Elapsed, LocalDateTime, OperationStatus, Requests};
pub use error::{ProviderError, Result, WorkflowError};
pub use models::{
    CodingRequest, ExecutionResult, RequestStatus, RequestUpdate, StoredRequest, WorkflowStep,
};
pub use session::{Session, User};
pub use store::{MemoryStore, RequestStore, SqliteStore, StoreBuilder};
pub use workflow::{Controller, Event, WorkflowRunner};
