//! Display implementations for the request model.
//!
//! Everything renders as markdown so the CLI can hand it to the terminal
//! renderer unchanged.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{CodingRequest, StoredRequest, MAX_DEBUG_ATTEMPTS};

impl CodingRequest {
    fn fmt_metadata(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- ID: {}", self.id)?;
        writeln!(f, "- Status: {}", self.status.with_icon())?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        if self.debug_attempts > 0 {
            writeln!(
                f,
                "- Debug attempts: {}/{MAX_DEBUG_ATTEMPTS}",
                self.debug_attempts
            )?;
        }
        Ok(())
    }

    fn fmt_sections(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(plan) = &self.plan {
            writeln!(f, "\n## Plan\n")?;
            writeln!(f, "{}", plan.trim_end())?;
        }

        if let Some(code) = &self.code {
            writeln!(f, "\n## Code\n")?;
            writeln!(f, "```python\n{}\n```", code.trim_end())?;
        }

        if let Some(output) = &self.output {
            writeln!(f, "\n## Output\n")?;
            writeln!(f, "```text\n{}\n```", output.trim_end())?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "\n## Errors\n")?;
            for error in &self.errors {
                writeln!(f, "- `{error}`")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for CodingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.description)?;
        writeln!(f)?;
        self.fmt_metadata(f)?;
        self.fmt_sections(f)
    }
}

impl fmt::Display for StoredRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.request.description)?;
        writeln!(f)?;
        self.request.fmt_metadata(f)?;
        writeln!(f, "- Owner: {}", self.user_id)?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;
        self.request.fmt_sections(f)
    }
}
