//! Async handle over the single SQLite connection.
//!
//! Services are synchronous; [`Store::call`] moves each one onto the blocking
//! pool and holds the connection lock for its duration.

use anyhow::{Context, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (and migrate) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = dodo_core::db::open_database(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database, used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = dodo_core::db::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a storage error if the lock is
    /// poisoned or the task panicked.
    pub async fn call<T, F>(&self, f: F) -> dodo_core::Result<T>
    where
        F: FnOnce(&mut Connection) -> dodo_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| anyhow!("database connection lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .context("database task failed")?
    }
}
