//! Destination records and the row projector.
//!
//! A type becomes a destination for query results by implementing [`Record`],
//! normally through the [`record!`](crate::record!) macro. The implementation
//! is a static field table plus a way to hand out a writable [`Slot`] for a
//! field, so the projector never needs to know the concrete type.

use std::collections::HashMap;

use crate::error::MapError;
use crate::row::{fold_name, Cell, Row};
use crate::value::{CellValue, ColumnKind};

/// One declared field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// The Rust identifier as written, possibly a raw identifier such as `r#type`.
    pub ident: &'static str,
    pub kind: ColumnKind,
}

impl FieldDef {
    pub const fn new(ident: &'static str, kind: ColumnKind) -> Self {
        Self { ident, kind }
    }

    /// Column name this field binds to.
    pub fn name(&self) -> &'static str {
        self.ident.strip_prefix("r#").unwrap_or(self.ident)
    }
}

/// A writable reference to a record field.
#[derive(Debug)]
pub enum Slot<'a> {
    Integer(&'a mut i64),
    Text(&'a mut String),
    Real(&'a mut f64),
    Boolean(&'a mut bool),
}

impl Slot<'_> {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Slot::Integer(_) => ColumnKind::Integer,
            Slot::Text(_) => ColumnKind::Text,
            Slot::Real(_) => ColumnKind::Real,
            Slot::Boolean(_) => ColumnKind::Boolean,
        }
    }

    /// Write `cell` into the field, failing if the kinds disagree.
    pub fn assign(self, field: &FieldDef, cell: &Cell) -> Result<(), MapError> {
        match (self, &cell.value) {
            (Slot::Integer(dst), CellValue::Integer(v)) => *dst = *v,
            (Slot::Text(dst), CellValue::Text(v)) => dst.clone_from(v),
            (Slot::Real(dst), CellValue::Real(v)) => *dst = *v,
            (Slot::Boolean(dst), CellValue::Boolean(v)) => *dst = *v,
            (slot, value) => {
                return Err(MapError::FieldTypeMismatch {
                    field: field.name(),
                    field_kind: slot.kind(),
                    column: cell.name().to_string(),
                    column_kind: value.kind(),
                })
            }
        }
        Ok(())
    }
}

/// Rust types that can back a record field.
pub trait FieldType {
    const KIND: ColumnKind;

    fn slot(&mut self) -> Slot<'_>;
}

impl FieldType for i64 {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Integer(self)
    }
}

impl FieldType for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Text(self)
    }
}

impl FieldType for f64 {
    const KIND: ColumnKind = ColumnKind::Real;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Real(self)
    }
}

impl FieldType for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Boolean(self)
    }
}

/// A type query rows can be projected onto.
///
/// `Default` supplies the zero value for fields no column matches.
pub trait Record: Default {
    /// Writable fields, in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Writable slot for the field whose identifier is `ident`.
    fn slot(&mut self, ident: &str) -> Option<Slot<'_>>;
}

/// A record stored in a table of a fixed name.
pub trait TableModel: Record {
    fn table_name() -> &'static str;
}

/// Implement [`Record`] (and optionally [`TableModel`]) for a struct.
///
/// ```
/// use rust_sqlite_orm::record;
///
/// #[derive(Debug, Default)]
/// struct User {
///     name: String,
///     age: i64,
///     height: f64,
/// }
///
/// record!(User => "user" { name: String, age: i64, height: f64 });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty => $table:literal { $($field:ident : $fty:ty),* $(,)? }) => {
        $crate::record!($ty { $($field : $fty),* });

        impl $crate::record::TableModel for $ty {
            fn table_name() -> &'static str {
                $table
            }
        }
    };
    ($ty:ty { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::record::Record for $ty {
            const FIELDS: &'static [$crate::record::FieldDef] = &[
                $($crate::record::FieldDef::new(
                    stringify!($field),
                    <$fty as $crate::record::FieldType>::KIND,
                )),*
            ];

            fn slot(&mut self, ident: &str) -> Option<$crate::record::Slot<'_>> {
                $(
                    if ident == stringify!($field) {
                        return Some(<$fty as $crate::record::FieldType>::slot(&mut self.$field));
                    }
                )*
                None
            }
        }
    };
}

/// Project one row onto `dest`.
///
/// Fields without a matching column keep their current value and columns
/// without a matching field are ignored. Names compare case-insensitively.
pub fn project<T: Record>(dest: &mut T, row: &Row) -> Result<(), MapError> {
    let lookup: HashMap<String, &Cell> = row
        .cells()
        .iter()
        .map(|cell| (fold_name(cell.name()), cell))
        .collect();

    for field in T::FIELDS {
        let Some(cell) = lookup.get(&fold_name(field.name())) else {
            continue;
        };
        let Some(slot) = dest.slot(field.ident) else {
            continue;
        };
        slot.assign(field, cell)?;
    }
    Ok(())
}

/// Project a row onto a fresh `T` and append it to `dest`.
pub fn project_push<T: Record>(dest: &mut Vec<T>, row: &Row) -> Result<(), MapError> {
    let mut item = T::default();
    project(&mut item, row)?;
    dest.push(item);
    Ok(())
}
