//! Async lifecycle wrapper around [`SqliteDb`].
//!
//! Calls are serialized through an async mutex and run on the calling task;
//! the store itself is still blocking.

use async_trait::async_trait;
use futures::lock::Mutex;
use tracing::info;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::sqlite::{Db, ExecResult, SqliteConfig, SqliteDb};
use crate::value::Value;

/// Async access to a database.
#[async_trait]
pub trait AsyncDb {
    async fn exec(&self, statement: &str, args: &[Value]) -> Result<ExecResult>;

    async fn query_row<T>(&self, statement: &str, args: &[Value]) -> Result<T>
    where
        T: Record + Send + 'static;

    async fn query<T>(&self, statement: &str, args: &[Value]) -> Result<Vec<T>>
    where
        T: Record + Send + 'static;
}

/// A database opened on `start` and closed on `stop`.
pub struct SqliteService {
    config: SqliteConfig,
    init_script: Option<String>,
    db: Mutex<Option<SqliteDb>>,
}

impl SqliteService {
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            init_script: None,
            db: Mutex::new(None),
        }
    }

    /// Statements run once every time the service starts.
    pub fn with_init_script(mut self, script: impl Into<String>) -> Self {
        self.init_script = Some(script.into());
        self
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    pub async fn is_started(&self) -> bool {
        self.db.lock().await.is_some()
    }

    /// Open the database. Starting a started service is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut guard = self.db.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let db = SqliteDb::open_with(&self.config)?;
        if let Some(script) = &self.init_script {
            db.exec_batch(script)?;
        }
        info!(path = %self.config.db_path, "sqlite service started");
        *guard = Some(db);
        Ok(())
    }

    /// Close the database if it is open.
    pub async fn stop(&self) -> Result<()> {
        let db = self.db.lock().await.take();
        if let Some(db) = db {
            db.close()?;
            info!(path = %self.config.db_path, "sqlite service stopped");
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncDb for SqliteService {
    async fn exec(&self, statement: &str, args: &[Value]) -> Result<ExecResult> {
        let guard = self.db.lock().await;
        guard.as_ref().ok_or(Error::NotStarted)?.exec(statement, args)
    }

    async fn query_row<T>(&self, statement: &str, args: &[Value]) -> Result<T>
    where
        T: Record + Send + 'static,
    {
        let guard = self.db.lock().await;
        guard.as_ref().ok_or(Error::NotStarted)?.query_row(statement, args)
    }

    async fn query<T>(&self, statement: &str, args: &[Value]) -> Result<Vec<T>>
    where
        T: Record + Send + 'static,
    {
        let guard = self.db.lock().await;
        guard.as_ref().ok_or(Error::NotStarted)?.query(statement, args)
    }
}
