//! Error types for the workflow library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::WorkflowStep;

/// Errors raised by generation and execution providers.
///
/// Provider errors are never retried by the library. The controller records
/// them against the step that issued the call so the user can retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Error reported by the hosted API
    #[error("API error: {0}")]
    Api(String),

    /// Network or transport failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider answered without any text
    #[error("Empty response from provider")]
    EmptyResponse,

    /// The provider answered with a body we could not decode
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Missing API key, bad model name, and similar
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs are not part of the message.
        let err = err.without_url();
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Connection(err.to_string())
        }
    }
}

/// Comprehensive error type for all workflow operations.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A SQLite call failed
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Stored request not found for the given ID
    #[error("Request with ID {id} not found")]
    RequestNotFound { id: String },
    /// The database directory could not be created
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No default data directory could be determined
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Blank description, plan, reply, or similar
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// The stored error list is not valid JSON
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// No user is signed in
    #[error("Sign in before starting a request")]
    Unauthenticated,
    /// The event is not accepted in the current step
    #[error("Cannot {event} while in the {step} step")]
    InvalidTransition {
        step: WorkflowStep,
        event: &'static str,
    },
    /// A provider call is still outstanding
    #[error("Still waiting for {pending} to finish")]
    Busy { pending: &'static str },
    /// All automatic debug attempts have been used
    #[error("Maximum debug attempts ({max}) reached. Manual review may be needed.")]
    DebugBudgetExhausted { max: u32 },
    /// Provider failure surfaced outside a workflow step
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Pending [`WorkflowError::Database`] awaiting its rusqlite source.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Attaches the failing rusqlite call.
    pub fn with_source(self, source: rusqlite::Error) -> WorkflowError {
        WorkflowError::Database {
            message: self.message,
            source,
        }
    }
}

/// Pending [`WorkflowError::InvalidInput`] awaiting its reason.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Says what was wrong with the field.
    pub fn with_reason(self, reason: impl Into<String>) -> WorkflowError {
        WorkflowError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl WorkflowError {
    /// Starts a database error; finish it with `with_source`.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Starts a validation error for `field`; finish it with `with_reason`.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a blocking-task join failure.
    pub(crate) fn join(err: tokio::task::JoinError) -> Self {
        WorkflowError::Configuration {
            message: format!("Task join error: {err}"),
        }
    }
}

/// `.db_context(..)` for rusqlite results.
pub trait DatabaseResultExt<T> {
    /// Wraps the rusqlite error with `message`.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| WorkflowError::database(message).with_source(e))
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, WorkflowError>;
