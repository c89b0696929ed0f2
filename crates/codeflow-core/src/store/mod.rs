//! Persistence provider for coding requests.
//!
//! The workflow only needs three operations from its store: create a record
//! for a user, patch it as the workflow progresses, and list a user's records
//! newest first. [`RequestStore`] captures that contract so the runner can be
//! tested against an in-memory double; [`SqliteStore`] is the production
//! implementation backed by [`crate::db::Database`].
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │ WorkflowRunner  │───▶│   SqliteStore   │───▶│    Database     │
//! │  (async)        │    │ (spawn_blocking)│    │   (rusqlite)    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::task;

use crate::{
    db::Database,
    error::{Result, WorkflowError},
    models::{CodingRequest, RequestUpdate, StoredRequest},
};

mod builder;
mod memory;

pub use builder::StoreBuilder;
pub use memory::MemoryStore;

/// Create, update, and list request records keyed by user.
///
/// Failures propagate to the caller; implementations never retry.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Stores a new record and returns its identifier.
    async fn create(&self, user_id: &str, request: &CodingRequest) -> Result<String>;

    /// Applies a partial update to an existing record.
    async fn update(&self, id: &str, update: RequestUpdate) -> Result<()>;

    /// Lists a user's records ordered by creation time, newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CodingRequest>>;

    /// Fetches a single record with its owner.
    async fn get(&self, id: &str) -> Result<Option<StoredRequest>>;
}

/// SQLite-backed request store.
///
/// Each operation opens its own connection on a blocking thread, so the
/// store is cheap to share between tasks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Path of the backing database file.
    pub fn database_path(&self) -> &std::path::Path {
        &self.db_path
    }
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn create(&self, user_id: &str, request: &CodingRequest) -> Result<String> {
        let db_path = self.db_path.clone();
        let user_id = user_id.to_string();
        let request = request.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.create_request(&user_id, &request)
        })
        .await
        .map_err(WorkflowError::join)?
    }

    async fn update(&self, id: &str, update: RequestUpdate) -> Result<()> {
        let db_path = self.db_path.clone();
        let id = id.to_string();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.update_request(&id, update)
        })
        .await
        .map_err(WorkflowError::join)?
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CodingRequest>> {
        let db_path = self.db_path.clone();
        let user_id = user_id.to_string();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_requests_by_user(&user_id)
        })
        .await
        .map_err(WorkflowError::join)?
    }

    async fn get(&self, id: &str) -> Result<Option<StoredRequest>> {
        let db_path = self.db_path.clone();
        let id = id.to_string();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_request(&id)
        })
        .await
        .map_err(WorkflowError::join)?
    }
}
