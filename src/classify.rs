//! Column classifier: declared SQL type name to [`ColumnKind`].

use crate::error::MapError;
use crate::value::ColumnKind;

/// Ordered prefix table. The first matching prefix wins, so `INTERVAL`
/// is an integer and `BIGINT` needs its own entry.
const PREFIXES: &[(&str, ColumnKind)] = &[
    ("INT", ColumnKind::Integer),
    ("BIGINT", ColumnKind::Integer),
    ("VARCHAR", ColumnKind::Text),
    ("TEXT", ColumnKind::Text),
    ("NVARCHAR", ColumnKind::Text),
    ("DECIMAL", ColumnKind::Real),
    ("FLOAT", ColumnKind::Real),
    ("BOOL", ColumnKind::Boolean),
    ("REAL", ColumnKind::Real),
    ("DOUBLE", ColumnKind::Real),
    ("CHAR", ColumnKind::Text),
    ("CLOB", ColumnKind::Text),
];

/// Classify the declared type of `column`.
///
/// Matching is a case-insensitive prefix match against [`PREFIXES`]. A column
/// with no declared type (an expression such as `count(*)`) is classified as
/// the empty name and fails like any other unknown type.
pub fn classify(column: &str, type_name: Option<&str>) -> Result<ColumnKind, MapError> {
    let type_name = type_name.unwrap_or("");
    let upper = type_name.trim().to_ascii_uppercase();
    PREFIXES
        .iter()
        .find(|(prefix, _)| upper.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .ok_or_else(|| MapError::UnsupportedColumnType {
            column: column.to_string(),
            type_name: type_name.to_string(),
        })
}
