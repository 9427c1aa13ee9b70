//! Execution facade over a single SQLite connection.

use std::time::Duration;

use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::builder::DropTable;
use crate::error::{Error, MapError, Result};
use crate::record::{self, Record, TableModel};
use crate::row::RowReader;
use crate::value::Value;

/// Connection settings for [`SqliteDb::open_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub db_path: String,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    pub read_only: bool,
    /// Create the database file if it does not exist. Ignored when `read_only`.
    pub create_if_missing: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            busy_timeout_ms: 5_000,
            read_only: false,
            create_if_missing: true,
        }
    }
}

impl SqliteConfig {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }
}

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: usize,
}

/// Operations shared by database handles.
pub trait Db {
    fn exec(&self, statement: &str, args: &[Value]) -> Result<ExecResult>;

    /// Bind exactly one row onto `dest`.
    fn query_row_into<T: Record>(
        &self,
        dest: &mut T,
        statement: &str,
        args: &[Value],
    ) -> Result<()>;

    /// Replace the contents of `dest` with one record per row.
    fn query_into<T: Record>(
        &self,
        dest: &mut Vec<T>,
        statement: &str,
        args: &[Value],
    ) -> Result<()>;
}

/// A row of the `sqlite_master` catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqliteMaster {
    pub r#type: String,
    pub name: String,
    pub tbl_name: String,
    pub rootpage: i64,
    pub sql: String,
}

crate::record!(SqliteMaster => "sqlite_master" {
    r#type: String,
    name: String,
    tbl_name: String,
    rootpage: i64,
    sql: String,
});

/// An open SQLite database.
///
/// The connection is released when the value is dropped; use
/// [`SqliteDb::close`] to observe close errors.
#[derive(Debug)]
pub struct SqliteDb {
    conn: Connection,
    path: String,
}

impl SqliteDb {
    /// Open the database at `path` with default settings.
    pub fn open(path: impl Into<String>) -> Result<Self> {
        Self::open_with(&SqliteConfig::new(path))
    }

    pub fn open_with(config: &SqliteConfig) -> Result<Self> {
        let path = config.db_path.clone();
        let connection_error = |source: rusqlite::Error| {
            error!(path = %path, error = %source, "failed to open sqlite database");
            Error::Connection {
                path: path.clone(),
                source,
            }
        };

        let conn = Connection::open_with_flags(&config.db_path, config.open_flags())
            .map_err(connection_error)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(connection_error)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(connection_error)?;

        info!(path = %config.db_path, read_only = config.read_only, "opened sqlite database");
        Ok(Self {
            conn,
            path: config.db_path.clone(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting any error.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        match self.conn.close() {
            Ok(()) => {
                info!(path = %path, "closed sqlite database");
                Ok(())
            }
            Err((_conn, source)) => {
                error!(path = %path, error = %source, "failed to close sqlite database");
                Err(Error::Close(source))
            }
        }
    }

    /// Run a script of `;`-separated statements without arguments.
    pub fn exec_batch(&self, script: &str) -> Result<()> {
        self.conn.execute_batch(script).map_err(|source| {
            error!(statement = script, error = %source, "exec batch failed");
            Error::Exec {
                statement: script.to_string(),
                args: Vec::new(),
                source,
            }
        })?;
        info!(statement = script, "exec batch");
        Ok(())
    }

    /// Single-record query returning the record.
    pub fn query_row<T: Record>(&self, statement: &str, args: &[Value]) -> Result<T> {
        let mut dest = T::default();
        self.query_row_into(&mut dest, statement, args)?;
        Ok(dest)
    }

    /// Sequence query returning the records.
    pub fn query<T: Record>(&self, statement: &str, args: &[Value]) -> Result<Vec<T>> {
        let mut dest = Vec::new();
        self.query_into(&mut dest, statement, args)?;
        Ok(dest)
    }

    pub fn list<T: Record>(
        &self,
        dest: &mut Vec<T>,
        statement: &str,
        args: &[Value],
    ) -> Result<()> {
        self.query_into(dest, statement, args)
    }

    /// Schema catalog entries that carry SQL text (automatic indexes have none).
    pub fn show_tables(&self) -> Result<Vec<SqliteMaster>> {
        self.query(
            "SELECT type, name, tbl_name, rootpage, sql FROM sqlite_master WHERE sql IS NOT NULL",
            &[],
        )
    }

    pub fn drop_table<M: TableModel>(&self) -> Result<ExecResult> {
        DropTable::for_model::<M>().with_db(self).exec()
    }

    /// Create the model's table with one column per record field.
    pub fn create_table<M: TableModel>(&self) -> Result<ExecResult> {
        self.exec(&create_table_sql::<M>(), &[])
    }

    fn query_error(statement: &str, args: &[Value], source: rusqlite::Error) -> Error {
        error!(statement, ?args, error = %source, "query failed");
        Error::Query {
            statement: statement.to_string(),
            args: args.to_vec(),
            source,
        }
    }

    fn mapping_error(statement: &str, args: &[Value], source: MapError) -> Error {
        error!(statement, ?args, error = %source, "mapping query rows failed");
        Error::Mapping {
            statement: statement.to_string(),
            args: args.to_vec(),
            source,
        }
    }
}

impl Db for SqliteDb {
    fn exec(&self, statement: &str, args: &[Value]) -> Result<ExecResult> {
        let rows_affected = self
            .conn
            .execute(statement, params_from_iter(args))
            .map_err(|source| {
                error!(statement, ?args, error = %source, "exec failed");
                Error::Exec {
                    statement: statement.to_string(),
                    args: args.to_vec(),
                    source,
                }
            })?;
        let result = ExecResult {
            last_insert_id: self.conn.last_insert_rowid(),
            rows_affected,
        };
        info!(statement, ?args, ?result, "exec");
        Ok(result)
    }

    fn query_row_into<T: Record>(
        &self,
        dest: &mut T,
        statement: &str,
        args: &[Value],
    ) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(statement)
            .map_err(|e| Self::query_error(statement, args, e))?;
        let mut reader = RowReader::new(&stmt);
        let mut rows = stmt
            .query(params_from_iter(args))
            .map_err(|e| Self::query_error(statement, args, e))?;

        let first = match rows.next().map_err(|e| Self::query_error(statement, args, e))? {
            Some(row) => reader
                .read(row)
                .map_err(|e| Self::mapping_error(statement, args, e))?,
            None => {
                error!(statement, ?args, "query returned no rows");
                return Err(Error::EmptyResult {
                    statement: statement.to_string(),
                    args: args.to_vec(),
                });
            }
        };

        if rows
            .next()
            .map_err(|e| Self::query_error(statement, args, e))?
            .is_some()
        {
            error!(statement, ?args, "query returned more than one row");
            return Err(Error::MultipleRows {
                statement: statement.to_string(),
                args: args.to_vec(),
            });
        }

        let mut item = T::default();
        record::project(&mut item, &first).map_err(|e| Self::mapping_error(statement, args, e))?;
        *dest = item;
        debug!(statement, ?args, "query row");
        Ok(())
    }

    fn query_into<T: Record>(
        &self,
        dest: &mut Vec<T>,
        statement: &str,
        args: &[Value],
    ) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(statement)
            .map_err(|e| Self::query_error(statement, args, e))?;
        let mut reader = RowReader::new(&stmt);
        let mut rows = stmt
            .query(params_from_iter(args))
            .map_err(|e| Self::query_error(statement, args, e))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|e| Self::query_error(statement, args, e))? {
            let row = reader
                .read(row)
                .map_err(|e| Self::mapping_error(statement, args, e))?;
            record::project_push(&mut items, &row)
                .map_err(|e| Self::mapping_error(statement, args, e))?;
        }

        debug!(statement, ?args, rows = items.len(), "query");
        *dest = items;
        Ok(())
    }
}

/// `CREATE TABLE` text for a model, one column per field.
pub fn create_table_sql<M: TableModel>() -> String {
    let columns = M::FIELDS
        .iter()
        .map(|field| format!("{} {}", field.name().to_uppercase(), field.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", M::table_name().to_uppercase(), columns)
}
