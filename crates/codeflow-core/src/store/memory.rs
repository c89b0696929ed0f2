//! In-memory request store.

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::Mutex;

use super::RequestStore;
use crate::{
    error::{Result, WorkflowError},
    models::{CodingRequest, RequestUpdate, StoredRequest, MAX_DEBUG_ATTEMPTS},
};

/// Volatile [`RequestStore`] for tests and throwaway sessions.
///
/// Follows the same ordering and validation rules as the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all users.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, user_id: &str, request: &CodingRequest) -> Result<String> {
        if user_id.trim().is_empty() {
            return Err(WorkflowError::invalid_input("user_id").with_reason("must not be empty"));
        }

        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.request.id == request.id) {
            return Err(WorkflowError::invalid_input("id")
                .with_reason(format!("request {} already exists", request.id)));
        }

        records.push(StoredRequest {
            user_id: user_id.to_string(),
            updated_at: Timestamp::now(),
            request: request.clone(),
        });
        Ok(request.id.clone())
    }

    async fn update(&self, id: &str, update: RequestUpdate) -> Result<()> {
        if update.debug_attempts.is_some_and(|n| n > MAX_DEBUG_ATTEMPTS) {
            return Err(WorkflowError::invalid_input("debug_attempts")
                .with_reason(format!("must not exceed {MAX_DEBUG_ATTEMPTS}")));
        }

        let mut records = self.records.lock().await;
        let stored = records
            .iter_mut()
            .find(|r| r.request.id == id)
            .ok_or_else(|| WorkflowError::RequestNotFound { id: id.to_string() })?;

        let request = &mut stored.request;
        if let Some(plan) = update.plan {
            request.plan = Some(plan);
        }
        if let Some(code) = update.code {
            request.code = Some(code);
        }
        if let Some(output) = update.output {
            request.output = output;
        }
        if let Some(errors) = update.errors {
            request.errors = errors;
        }
        if let Some(status) = update.status {
            request.status = status;
        }
        if let Some(attempts) = update.debug_attempts {
            request.debug_attempts = attempts;
        }
        stored.updated_at = Timestamp::now();

        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CodingRequest>> {
        let records = self.records.lock().await;
        // Reverse insertion order first so the stable sort breaks ties newest-first.
        let mut owned: Vec<CodingRequest> = records
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.request.clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredRequest>> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|r| r.request.id == id).cloned())
    }
}
