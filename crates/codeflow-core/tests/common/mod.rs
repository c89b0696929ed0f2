use std::sync::Arc;

use codeflow_core::{
    providers::{SimulatedExecutor, TemplateGenerator},
    Session, SqliteStore, StoreBuilder, WorkflowConfig, WorkflowRunner,
};
use tempfile::TempDir;

/// Helper function to create a store backed by a throwaway database
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("nested").join("test.db");
    let store = StoreBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create store");
    (temp_dir, store)
}

/// Helper function to create a runner for `user_id` with no artificial latency
pub fn create_test_runner(user_id: &str, store: SqliteStore) -> WorkflowRunner {
    let config = WorkflowConfig::instant().with_seed(11);
    WorkflowRunner::new(
        Session::signed_in(user_id).expect("Failed to sign in"),
        Arc::new(TemplateGenerator::new(&config)),
        Arc::new(SimulatedExecutor::new(&config)),
        Arc::new(store),
        config,
    )
}
