//! Document flattening
//!
//! Nested objects become virtual tables keyed by their parent's primary key.
//! All tables of a run live in one map owned by [`Flattener`]; recursive calls
//! address tables by name instead of holding references into the map.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use super::config::InferenceConfig;
use super::error::InferenceError;
use super::inferrer::InferenceStats;
use super::naming::{IdentifierNamer, combine_path};
use super::types::{SqlType, collapses, promote, promote_key};
use crate::document::{Document, Value};
use crate::models::{Column, ForeignKey, Table, TableShape};

/// A key column on its way into a descendant table
#[derive(Debug, Clone, PartialEq)]
pub struct KeyColumn {
    /// Table the column was taken from
    pub origin_table: String,
    pub column: Column,
}

/// Ordered key columns a descendant table inherits as its leading key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKeyChain {
    keys: Vec<KeyColumn>,
}

impl ForeignKeyChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary key of `table`, as inherited by its descendants
    pub fn from_table(table: &Table) -> Self {
        Self::from_columns(&table.sql_name, table.primary_key())
    }

    pub fn from_columns<'a>(
        origin_table: &str,
        columns: impl IntoIterator<Item = &'a Column>,
    ) -> Self {
        Self {
            keys: columns
                .into_iter()
                .map(|column| KeyColumn {
                    origin_table: origin_table.to_string(),
                    column: column.clone(),
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyColumn> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Leading key columns for a new table named `table_name`
    ///
    /// Columns inherited from another table reference it as a foreign key;
    /// columns that already belong to `table_name` are copied unchanged.
    pub fn seed_columns(&self, table_name: &str) -> Vec<Column> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let mut column = key.column.clone();
                column.primary_key = i + 1;
                if key.origin_table != table_name {
                    column.foreign_key = Some(ForeignKey {
                        table_name: key.origin_table.clone(),
                        column_name: key.column.sql_name.clone(),
                    });
                }
                column
            })
            .collect()
    }
}

/// Mutable state of one inference run
pub(crate) struct Flattener {
    pub(super) collection: String,
    pub(super) config: InferenceConfig,
    pub(super) namer: IdentifierNamer,
    pub(super) tables: BTreeMap<String, Table>,
    /// Structural path to table name
    paths: HashMap<String, String>,
    pub(super) stats: InferenceStats,
}

impl Flattener {
    pub(crate) fn new(collection: impl Into<String>, config: InferenceConfig) -> Self {
        Self {
            collection: collection.into(),
            config,
            namer: IdentifierNamer::new(),
            tables: BTreeMap::new(),
            paths: HashMap::new(),
            stats: InferenceStats::default(),
        }
    }

    /// Flatten `document` into the table at `path`
    ///
    /// Object fields recurse into child tables, array fields are handed to
    /// [`Flattener::flatten_array`], and everything else becomes a column of
    /// this table. On the root document the identifier field is handled first
    /// and becomes key position 1.
    pub(crate) fn flatten_document(
        &mut self,
        document: &Document,
        chain: &ForeignKeyChain,
        path: &str,
        is_root: bool,
    ) -> Result<(), InferenceError> {
        let shape = if is_root {
            TableShape::Collection
        } else {
            TableShape::Document
        };
        let table_name = self.table_name(path)?;
        self.ensure_table(&table_name, path, shape, chain);

        let id_field = self.config.id_field.clone();
        let is_key = |field: &str| is_root && field == id_field;

        let id_entry = if is_root {
            document.get(&id_field).map(|value| (id_field.as_str(), value))
        } else {
            None
        };
        let fields = id_entry
            .into_iter()
            .chain(document.iter().filter(|(field, _)| !is_key(field)));

        for (field, value) in fields {
            if is_key(field) {
                self.record_key(&table_name, field, value)?;
                continue;
            }

            let field_path = combine_path(path, field);
            let column_name = self.name(field)?;
            let kind = value.kind();
            let prior = self.prior_field_type(&table_name, &field_path);
            let next = promote(prior, kind);
            self.note_promotion(&field_path, prior, next);

            match (next, value) {
                (SqlType::Object, Value::Document(child)) => {
                    self.remove_placeholder(&table_name, &field_path);
                    let child_chain = self.chain_of(&table_name);
                    self.flatten_document(child, &child_chain, &field_path, false)?;
                }
                (SqlType::Array, Value::Array(items)) => {
                    self.remove_placeholder(&table_name, &field_path);
                    let child_chain = self.chain_of(&table_name);
                    self.flatten_array(items, &child_chain, &field_path, 0)?;
                }
                (SqlType::Object | SqlType::Array, _) => {
                    // A null under a complex field adds nothing
                }
                _ => {
                    if collapses(prior, next) {
                        debug!(
                            table = %table_name,
                            field = %field_path,
                            sql_type = %next,
                            "Nested field collapsed to a scalar"
                        );
                        self.discard_subtree(&field_path);
                    }
                    self.upsert_column(
                        &table_name,
                        Column::new(field_path, column_name, next, kind),
                    );
                }
            }
        }

        if is_root {
            self.propagate_key_type(&table_name)?;
        }

        Ok(())
    }

    fn record_key(
        &mut self,
        table_name: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), InferenceError> {
        let column_name = self.id_column_name()?;
        let kind = value.kind();
        let Some(table) = self.tables.get_mut(table_name) else {
            return Ok(());
        };

        match table.column_mut(&column_name) {
            Some(column) => {
                let next = promote_key(column.sql_type, kind);
                if next != column.sql_type {
                    debug!(
                        column = %column_name,
                        from = %column.sql_type,
                        to = %next,
                        "Identifier type promoted"
                    );
                    if column.sql_type != SqlType::Null && next == SqlType::Varchar {
                        self.stats.type_demotions += 1;
                    }
                }
                column.sql_type = next;
                column.source_kind = kind;
            }
            None => {
                let mut column = Column::new(
                    field,
                    column_name,
                    promote_key(SqlType::Null, kind),
                    kind,
                );
                column.primary_key = 1;
                table.push_column(column);
            }
        }
        Ok(())
    }

    /// Write the identifier column's type into every table that inherited it
    fn propagate_key_type(&mut self, root_table: &str) -> Result<(), InferenceError> {
        let column_name = self.id_column_name()?;
        let Some((sql_type, source_kind)) = self
            .tables
            .get(root_table)
            .and_then(|t| t.column(&column_name))
            .map(|c| (c.sql_type, c.source_kind))
        else {
            return Ok(());
        };

        for (name, table) in self.tables.iter_mut() {
            if name == root_table {
                continue;
            }
            if let Some(column) = table.column_mut(&column_name)
                && column.sql_type != sql_type
            {
                debug!(
                    table = %name,
                    column = %column_name,
                    from = %column.sql_type,
                    to = %sql_type,
                    "Propagated key type"
                );
                column.sql_type = sql_type;
                column.source_kind = source_kind;
                self.stats.key_type_propagations += 1;
            }
        }
        Ok(())
    }

    /// Type previously committed for a field: its column, else its child table's shape
    fn prior_field_type(&self, table_name: &str, field_path: &str) -> SqlType {
        let column_type = self
            .tables
            .get(table_name)
            .and_then(|t| t.field_column(field_path))
            .map(|c| c.sql_type)
            .unwrap_or(SqlType::Null);
        if column_type != SqlType::Null {
            return column_type;
        }

        match self.table_at(field_path).map(|t| t.shape) {
            Some(TableShape::Document) => SqlType::Object,
            Some(TableShape::Array) => SqlType::Array,
            _ => column_type,
        }
    }

    pub(super) fn note_promotion(&mut self, path: &str, prior: SqlType, next: SqlType) {
        if prior != SqlType::Null && prior != next && next == SqlType::Varchar {
            trace!(path, from = %prior, "Type conflict demoted to VARCHAR");
            self.stats.type_demotions += 1;
        }
    }

    pub(super) fn name(&mut self, path: &str) -> Result<String, InferenceError> {
        self.namer.to_name(path, self.config.max_identifier_length)
    }

    pub(super) fn table_name(&mut self, path: &str) -> Result<String, InferenceError> {
        if path.is_empty() {
            let collection = self.collection.clone();
            return self.name(&collection);
        }
        let full = combine_path(&self.collection, path);
        self.name(&full)
    }

    fn id_column_name(&mut self) -> Result<String, InferenceError> {
        let full = combine_path(&self.collection, &self.config.id_field);
        self.name(&full)
    }

    pub(super) fn table_at(&self, path: &str) -> Option<&Table> {
        self.paths.get(path).and_then(|name| self.tables.get(name))
    }

    /// Create the table if missing, seeding it with the chain's key columns
    pub(super) fn ensure_table(
        &mut self,
        table_name: &str,
        path: &str,
        shape: TableShape,
        chain: &ForeignKeyChain,
    ) {
        if self.tables.contains_key(table_name) {
            return;
        }

        let mut table = Table::new(table_name, self.collection.as_str(), path, shape);
        table.columns = chain.seed_columns(table_name);
        trace!(table = %table_name, keys = chain.len(), "Created table");
        self.paths.insert(path.to_string(), table_name.to_string());
        self.tables.insert(table_name.to_string(), table);
    }

    /// Drop the table at `path` and every table nested beneath it
    pub(super) fn discard_subtree(&mut self, path: &str) {
        let before = self.tables.len();
        self.tables.retain(|_, table| !table.is_within(path));
        let tables = &self.tables;
        self.paths.retain(|_, name| tables.contains_key(name));
        let removed = before - self.tables.len();
        if removed > 0 {
            debug!(path, removed, "Discarded virtual tables");
            self.stats.tables_discarded += removed;
        }
    }

    /// The current primary key of a table as a chain
    pub(super) fn chain_of(&self, table_name: &str) -> ForeignKeyChain {
        self.tables
            .get(table_name)
            .map(ForeignKeyChain::from_table)
            .unwrap_or_default()
    }

    /// Insert a column, or update the type of the column for the same field
    pub(super) fn upsert_column(&mut self, table_name: &str, column: Column) {
        let Some(table) = self.tables.get_mut(table_name) else {
            return;
        };
        match table.field_column_mut(&column.field_path) {
            Some(existing) => {
                existing.sql_type = column.sql_type;
                existing.source_kind = column.source_kind;
            }
            None => table.push_column(column),
        }
    }

    /// Remove a NULL-typed placeholder column that turned out to be complex
    pub(super) fn remove_placeholder(&mut self, table_name: &str, field_path: &str) {
        let Some(table) = self.tables.get_mut(table_name) else {
            return;
        };
        if let Some(name) = table
            .field_column(field_path)
            .filter(|c| c.sql_type == SqlType::Null)
            .map(|c| c.sql_name.clone())
        {
            table.remove_column(&name);
        }
    }
}
