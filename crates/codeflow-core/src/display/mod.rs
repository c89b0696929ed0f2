//! Display formatting for requests and user feedback.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and one-off messages get small wrapper types. Everything is
//! markdown, rendered by the CLI's terminal renderer or printed as-is.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  CodingRequest  │    │ Wrapper types   │    │   Formatted     │
//! │  StoredRequest  │───▶│ (Requests, ...) │───▶│    markdown     │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: request history wrapper ([`Requests`])
//! - [`status`]: one-line outcome messages ([`OperationStatus`])
//! - [`datetime`]: timestamp and duration formatting
//! - [`models`]: Display implementations for the request model
//!
//! ```rust
//! use codeflow_core::display::OperationStatus;
//!
//! let status = OperationStatus::failure("Maximum debug attempts (3) reached.");
//! assert!(status.to_string().starts_with("Error:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod status;

pub use collections::Requests;
pub use datetime::{Elapsed, LocalDateTime};
pub use status::OperationStatus;
