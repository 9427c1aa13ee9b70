//! Row materializer.
//!
//! A [`RowReader`] is created per result set. It captures the column names and
//! declared types from the prepared statement, classifies them once on the
//! first fetched row, and then turns every driver row into an owned [`Row`] of
//! typed [`Cell`]s. A row is either scanned completely or not at all.

use std::rc::Rc;

use rusqlite::Statement;

use crate::classify::classify;
use crate::error::MapError;
use crate::value::{CellValue, ColumnKind};

/// Name and kind of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One scanned value with the column it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub column: Rc<Column>,
    pub value: CellValue,
}

impl Cell {
    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.column.kind
    }
}

/// A fetched row, one cell per result column in driver order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Case-insensitive lookup by column name. The last column wins on duplicates.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        let key = fold_name(name);
        self.cells
            .iter()
            .rev()
            .find(|cell| fold_name(cell.name()) == key)
    }
}

/// Key under which column and field names compare equal.
pub fn fold_name(name: &str) -> String {
    name.to_uppercase()
}

#[derive(Debug, Clone)]
struct DeclaredColumn {
    name: String,
    decl_type: Option<String>,
}

/// Materializes driver rows of a single result set.
#[derive(Debug)]
pub struct RowReader {
    declared: Vec<DeclaredColumn>,
    columns: Option<Vec<Rc<Column>>>,
}

impl RowReader {
    /// Capture column metadata from a prepared statement.
    pub fn new(stmt: &Statement<'_>) -> Self {
        let declared = stmt
            .columns()
            .iter()
            .map(|column| DeclaredColumn {
                name: column.name().to_string(),
                decl_type: column.decl_type().map(str::to_string),
            })
            .collect();
        Self {
            declared,
            columns: None,
        }
    }

    /// Column descriptors, classifying them on first use.
    pub fn columns(&mut self) -> Result<&[Rc<Column>], MapError> {
        if self.columns.is_none() {
            let columns = self
                .declared
                .iter()
                .map(|declared| {
                    let kind = classify(&declared.name, declared.decl_type.as_deref())?;
                    Ok(Rc::new(Column {
                        name: declared.name.clone(),
                        kind,
                    }))
                })
                .collect::<Result<Vec<_>, MapError>>()?;
            self.columns = Some(columns);
        }
        Ok(self.columns.as_deref().unwrap_or_default())
    }

    /// Scan the current driver row into a [`Row`].
    pub fn read(&mut self, row: &rusqlite::Row<'_>) -> Result<Row, MapError> {
        let columns = self.columns()?;
        let mut cells = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = scan(row, index, column.kind).map_err(|source| MapError::RowScan {
                column: column.name.clone(),
                index,
                source,
            })?;
            cells.push(Cell {
                column: Rc::clone(column),
                value,
            });
        }
        Ok(Row { cells })
    }
}

fn scan(row: &rusqlite::Row<'_>, index: usize, kind: ColumnKind) -> rusqlite::Result<CellValue> {
    Ok(match kind {
        ColumnKind::Integer => CellValue::Integer(row.get(index)?),
        ColumnKind::Text => CellValue::Text(row.get(index)?),
        ColumnKind::Real => CellValue::Real(row.get(index)?),
        ColumnKind::Boolean => CellValue::Boolean(row.get(index)?),
    })
}
