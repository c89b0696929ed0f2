//! Database operations and SQLite management for coding requests.
//!
//! This module provides the low-level, blocking side of the request store:
//! connection setup, schema management, and the queries behind
//! [`crate::store::SqliteStore`]. Timestamps are stored as UTC milliseconds
//! so that ordering by creation time is a plain integer sort.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod migrations;
pub mod request_queries;

/// One open SQLite connection to the request table.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens (or creates) the database file and brings its schema up to date.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a private in-memory database, mostly useful in tests.
    pub fn in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
