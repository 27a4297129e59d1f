//! Table model for inferred schemas

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column::Column;

/// Where a table's rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableShape {
    /// The collection's own documents
    Collection,
    /// A nested object field
    Document,
    /// A nested array field (one row per element)
    Array,
}

impl TableShape {
    pub fn is_virtual(&self) -> bool {
        !matches!(self, TableShape::Collection)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: Uuid,
    pub sql_name: String,
    /// Collection the documents were read from (shared by virtual tables)
    pub collection_name: String,
    /// Structural path of the nested field (empty for the collection table)
    pub path: String,
    pub shape: TableShape,
    /// Columns in first-seen order
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(
        sql_name: impl Into<String>,
        collection_name: impl Into<String>,
        path: impl Into<String>,
        shape: TableShape,
    ) -> Self {
        let sql_name = sql_name.into();
        let collection_name = collection_name.into();
        let id = Self::generate_id(&collection_name, &sql_name);
        Self {
            id,
            sql_name,
            collection_name,
            path: path.into(),
            shape,
            columns: Vec::new(),
        }
    }

    /// Generate a deterministic UUID v5 for a table from its collection and name
    pub fn generate_id(collection_name: &str, sql_name: &str) -> Uuid {
        let key = format!("{}:{}", collection_name, sql_name);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }

    pub fn column(&self, sql_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.sql_name == sql_name)
    }

    pub fn column_mut(&mut self, sql_name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.sql_name == sql_name)
    }

    /// The non-key column holding values found at `field_path`
    ///
    /// Array tables keep scalar elements in a column whose path is the
    /// array's own path; generated index columns share that path but are keys.
    pub fn field_column(&self, field_path: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| !c.is_primary_key() && c.field_path == field_path)
    }

    pub fn field_column_mut(&mut self, field_path: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| !c.is_primary_key() && c.field_path == field_path)
    }

    pub fn has_column(&self, sql_name: &str) -> bool {
        self.column(sql_name).is_some()
    }

    /// Append a column, keeping existing order
    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Remove a column by name, returning it if present
    pub fn remove_column(&mut self, sql_name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.sql_name == sql_name)?;
        Some(self.columns.remove(pos))
    }

    /// Primary key columns ordered by key position
    pub fn primary_key(&self) -> Vec<&Column> {
        let mut keys: Vec<&Column> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        keys.sort_by_key(|c| c.primary_key);
        keys
    }

    /// Number of primary key columns
    pub fn primary_key_len(&self) -> usize {
        self.columns.iter().filter(|c| c.is_primary_key()).count()
    }

    pub fn foreign_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_foreign_key()).collect()
    }

    /// Whether `path` is this table's path or lies beneath it
    pub fn is_within(&self, path: &str) -> bool {
        self.path == path
            || (self.path.len() > path.len()
                && self.path.starts_with(path)
                && self.path[path.len()..].starts_with('.'))
    }
}
