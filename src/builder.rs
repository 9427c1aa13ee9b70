//! Fluent `DROP TABLE` construction.

use crate::error::Result;
use crate::record::TableModel;
use crate::sqlite::{Db, ExecResult};

/// A pending drop of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    table_name: String,
}

/// Start a drop of `table_name`.
///
/// ```no_run
/// # use rust_sqlite_orm::{drop_table, SqliteDb};
/// # fn main() -> rust_sqlite_orm::Result<()> {
/// let db = SqliteDb::open("app.db")?;
/// drop_table("user").with_db(&db).exec()?;
/// # Ok(())
/// # }
/// ```
pub fn drop_table(table_name: impl Into<String>) -> DropTable {
    DropTable::new(table_name)
}

impl DropTable {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    pub fn for_model<M: TableModel>() -> Self {
        Self::new(M::table_name())
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Statement text. Table names are upper-cased.
    pub fn sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table_name.to_uppercase())
    }

    pub fn with_db<D: Db>(self, db: &D) -> BoundDropTable<'_, D> {
        BoundDropTable { drop: self, db }
    }
}

/// A [`DropTable`] bound to a database, ready to run.
#[derive(Debug)]
pub struct BoundDropTable<'a, D> {
    drop: DropTable,
    db: &'a D,
}

impl<D: Db> BoundDropTable<'_, D> {
    pub fn exec(&self) -> Result<ExecResult> {
        self.db.exec(&self.drop.sql(), &[])
    }
}
