//! Request-related database queries.

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension, Row, ToSql};

use crate::{
    error::{DatabaseResultExt, Result, WorkflowError},
    models::{CodingRequest, RequestStatus, RequestUpdate, StoredRequest, MAX_DEBUG_ATTEMPTS},
};

const SELECT_REQUEST_COLUMNS: &str = "SELECT id, user_id, description, plan, code, output, errors, \
     status, debug_attempts, created_at, updated_at FROM coding_requests";

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn timestamp_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Timestamp> {
    let millis: i64 = row.get(column)?;
    Timestamp::from_millisecond(millis).map_err(|e| conversion_error(column, e))
}

fn stored_request_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRequest> {
    let errors_json: String = row.get(6)?;
    let errors: Vec<String> =
        serde_json::from_str(&errors_json).map_err(|e| conversion_error(6, e))?;

    let status_str: String = row.get(7)?;
    let status = status_str.parse::<RequestStatus>().map_err(|reason| {
        conversion_error(
            7,
            std::io::Error::new(std::io::ErrorKind::InvalidData, reason),
        )
    })?;

    Ok(StoredRequest {
        user_id: row.get(1)?,
        updated_at: timestamp_column(row, 10)?,
        request: CodingRequest {
            id: row.get(0)?,
            description: row.get(2)?,
            plan: row.get(3)?,
            code: row.get(4)?,
            output: row.get(5)?,
            errors,
            status,
            created_at: timestamp_column(row, 9)?,
            debug_attempts: row.get(8)?,
        },
    })
}

impl super::Database {
    /// Stores a new request for `user_id` and returns its identifier.
    pub fn create_request(&mut self, user_id: &str, request: &CodingRequest) -> Result<String> {
        if user_id.trim().is_empty() {
            return Err(WorkflowError::invalid_input("user_id").with_reason("must not be empty"));
        }
        if request.description.trim().is_empty() {
            return Err(
                WorkflowError::invalid_input("description").with_reason("must not be empty")
            );
        }

        let errors_json = serde_json::to_string(&request.errors)?;
        let now = Timestamp::now().as_millisecond();

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO coding_requests (id, user_id, description, plan, code, output, errors, status, debug_attempts, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                request.id,
                user_id,
                request.description,
                request.plan,
                request.code,
                request.output,
                errors_json,
                request.status.as_str(),
                request.debug_attempts,
                request.created_at.as_millisecond(),
                now,
            ],
        )
        .db_context("Failed to insert request")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(request.id.clone())
    }

    /// Applies a partial update to a stored request.
    pub fn update_request(&mut self, id: &str, update: RequestUpdate) -> Result<()> {
        if let Some(attempts) = update.debug_attempts {
            if attempts > MAX_DEBUG_ATTEMPTS {
                return Err(WorkflowError::invalid_input("debug_attempts")
                    .with_reason(format!("must not exceed {MAX_DEBUG_ATTEMPTS}")));
            }
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(plan) = update.plan {
            assignments.push("plan = ?");
            values.push(Box::new(plan));
        }
        if let Some(code) = update.code {
            assignments.push("code = ?");
            values.push(Box::new(code));
        }
        if let Some(output) = update.output {
            assignments.push("output = ?");
            values.push(Box::new(output));
        }
        if let Some(errors) = update.errors {
            assignments.push("errors = ?");
            values.push(Box::new(serde_json::to_string(&errors)?));
        }
        if let Some(status) = update.status {
            assignments.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(attempts) = update.debug_attempts {
            assignments.push("debug_attempts = ?");
            values.push(Box::new(attempts));
        }

        assignments.push("updated_at = ?");
        values.push(Box::new(Timestamp::now().as_millisecond()));
        values.push(Box::new(id.to_string()));

        let sql = format!(
            "UPDATE coding_requests SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let value_refs: Vec<&dyn ToSql> = values.iter().map(|v| &**v).collect();

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let changed = tx
            .execute(&sql, &value_refs[..])
            .db_context("Failed to update request")?;

        if changed == 0 {
            return Err(WorkflowError::RequestNotFound { id: id.to_string() });
        }

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(())
    }

    /// Lists a user's requests, newest first.
    pub fn list_requests_by_user(&self, user_id: &str) -> Result<Vec<CodingRequest>> {
        let mut stmt = self
            .connection
            .prepare(&format!(
                "{SELECT_REQUEST_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, seq DESC"
            ))
            .db_context("Failed to prepare query")?;

        let requests = stmt
            .query_map(params![user_id], stored_request_from_row)
            .db_context("Failed to query requests")?
            .map(|row| row.map(|stored| stored.request))
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch requests")?;

        Ok(requests)
    }

    /// Retrieves a stored request by its ID.
    pub fn get_request(&self, id: &str) -> Result<Option<StoredRequest>> {
        let mut stmt = self
            .connection
            .prepare(&format!("{SELECT_REQUEST_COLUMNS} WHERE id = ?1"))
            .db_context("Failed to prepare query")?;

        stmt.query_row(params![id], stored_request_from_row)
            .optional()
            .db_context("Failed to query request")
    }
}
