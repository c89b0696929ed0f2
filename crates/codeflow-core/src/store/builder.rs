//! Builder for creating and configuring request stores.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::SqliteStore;
use crate::{
    db::Database,
    error::{Result, WorkflowError},
};

/// Builder for [`SqliteStore`] instances.
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    database_path: Option<PathBuf>,
}

impl StoreBuilder {
    /// Builder that resolves the XDG data path unless told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the database file; `None` keeps the XDG default.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/codeflow/codeflow.db` or
    /// `~/.local/share/codeflow/codeflow.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Builds the store, creating the database file and schema if needed.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::FileSystem` if the parent directory cannot be
    /// created, `WorkflowError::XdgDirectory` if no default location exists,
    /// and `WorkflowError::Database` if schema initialization fails.
    pub async fn build(self) -> Result<SqliteStore> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| WorkflowError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let init_path = db_path.clone();
        task::spawn_blocking(move || Database::new(&init_path).map(drop))
            .await
            .map_err(WorkflowError::join)??;

        debug!("Request store ready at {}", db_path.display());
        Ok(SqliteStore::new(db_path))
    }

    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("codeflow")
            .place_data_file("codeflow.db")
            .map_err(|e| WorkflowError::XdgDirectory(e.to_string()))
    }
}
