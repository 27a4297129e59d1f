//! Column model for inferred tables

use serde::{Deserialize, Serialize};

use crate::document::ValueKind;
use crate::inference::SqlType;

/// Foreign key reference to another table's column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// Target table name
    pub table_name: String,
    /// Column name in the target table
    pub column_name: String,
}

/// Column model representing a projected document field
///
/// A column either mirrors a scalar field (`field_path` names it), is an
/// inherited key copied from an ancestor table, or is a generated array index.
///
/// # Example
///
/// ```rust
/// use docdb_schema::document::ValueKind;
/// use docdb_schema::inference::SqlType;
/// use docdb_schema::models::Column;
///
/// let column = Column::new("address.city", "city", SqlType::Varchar, ValueKind::String);
/// assert!(!column.is_primary_key());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Dotted path from the root document to the value
    pub field_path: String,
    /// SQL identifier
    pub sql_name: String,
    /// SQL-visible type
    pub sql_type: SqlType,
    /// Kind of the value last observed for this column
    pub source_kind: ValueKind,
    /// Whether the column has no backing field value (array indexes)
    #[serde(default)]
    pub is_generated: bool,
    /// Whether the column holds an array position
    #[serde(default)]
    pub is_index: bool,
    /// 1-based position within the primary key (0 = not a key column)
    #[serde(default)]
    pub primary_key: usize,
    /// Foreign key reference if this column mirrors a parent table's key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// Create a plain, non-key column
    pub fn new(
        field_path: impl Into<String>,
        sql_name: impl Into<String>,
        sql_type: SqlType,
        source_kind: ValueKind,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            sql_name: sql_name.into(),
            sql_type,
            source_kind,
            is_generated: false,
            is_index: false,
            primary_key: 0,
            foreign_key: None,
        }
    }

    /// Create a generated array index column at the given key position
    pub fn index(field_path: impl Into<String>, sql_name: impl Into<String>, position: usize) -> Self {
        Self {
            is_generated: true,
            is_index: true,
            primary_key: position,
            ..Self::new(field_path, sql_name, SqlType::BigInt, ValueKind::Int64)
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Index columns always carry a value; document fields may be absent
    pub fn nullable(&self) -> bool {
        !self.is_index
    }
}
