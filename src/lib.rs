//! Minimal object-relational mapping over SQLite for the Runar ecosystem.
//!
//! # Intention
//!
//! - Open a database file, run parameterized statements and map query
//!   results onto application records.
//! - Keep SQL in the caller's hands: statements are passed to SQLite as is.
//!
//! # Architectural Boundaries
//!
//! - Column types are classified from the declared SQL type of each result
//!   column ([`classify`]), rows are scanned into typed cells ([`row`]) and
//!   projected onto [`Record`] types by case-insensitive name ([`record`]).
//! - [`SqliteDb`] is the only place that talks to the driver.
//! - No query planning, migrations or SQL validation.

pub mod builder;
pub mod classify;
pub mod error;
pub mod record;
pub mod row;
pub mod service;
pub mod sqlite;
pub mod value;

pub use builder::{drop_table, BoundDropTable, DropTable};
pub use error::{Error, MapError, Result};
pub use record::{FieldDef, FieldType, Record, Slot, TableModel};
pub use row::{Cell, Column, Row, RowReader};
pub use service::{AsyncDb, SqliteService};
pub use sqlite::{create_table_sql, Db, ExecResult, SqliteConfig, SqliteDb, SqliteMaster};
pub use value::{CellValue, ColumnKind, Value};
