//! Collection wrapper types for displaying groups of requests.

use std::{fmt, ops::Index};

use super::datetime::LocalDateTime;
use crate::models::CodingRequest;

/// Newtype wrapper for displaying a request history.
///
/// Each request renders as a short summary (description, status, creation
/// time) rather than the full record. Handles empty collections gracefully.
///
/// # Examples
///
/// ```rust
/// use codeflow_core::{display::Requests, models::CodingRequest};
/// use jiff::Timestamp;
///
/// let requests = Requests(vec![CodingRequest::new(
///     "1700000000000",
///     "Build a web scraper",
///     Timestamp::now(),
/// )]);
///
/// let output = format!("{}", requests);
/// assert!(output.contains("## Build a web scraper (ID: 1700000000000)"));
/// assert_eq!(format!("{}", Requests(vec![])), "No requests found.\n");
/// ```
pub struct Requests(pub Vec<CodingRequest>);

impl Requests {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&CodingRequest> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CodingRequest> {
        self.0.iter()
    }
}

impl Index<usize> for Requests {
    type Output = CodingRequest;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Requests {
    type Item = CodingRequest;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Requests {
    type Item = &'a CodingRequest;
    type IntoIter = std::slice::Iter<'a, CodingRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Requests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No requests found.");
        }

        for request in &self.0 {
            writeln!(f, "## {} (ID: {})", request.description, request.id)?;
            writeln!(f)?;
            writeln!(f, "- **Status**: {}", request.status.with_icon())?;
            writeln!(f, "- **Created**: {}", LocalDateTime(&request.created_at))?;
            if request.debug_attempts > 0 {
                writeln!(f, "- **Debug attempts**: {}", request.debug_attempts)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
