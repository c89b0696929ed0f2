//! Schema setup for the request table.

use crate::error::{DatabaseResultExt, Result};

impl super::Database {
    /// Creates the table and index from `assets/schema.sql` if missing.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        self.connection
            .execute_batch(include_str!("../../assets/schema.sql"))
            .db_context("Failed to initialize database schema")
    }
}
