//! Array flattening
//!
//! An array field becomes one virtual table with a row per element. Each
//! nesting level adds a generated `index_lvl_<n>` key column; scalar elements
//! land in a single `value` column and document elements contribute their
//! fields directly to the array's table.

use tracing::debug;

use super::document::{Flattener, ForeignKeyChain};
use super::error::InferenceError;
use super::naming::combine_path;
use super::types::{SqlType, promote};
use crate::document::{Value, ValueKind};
use crate::models::{Column, Table, TableShape};

/// Column holding scalar array elements
pub const VALUE_COLUMN_NAME: &str = "value";

/// Path segment prefix of generated index columns
pub const INDEX_COLUMN_PREFIX: &str = "index_lvl_";

/// Number of index levels recorded for the array at `path`
fn recorded_levels(table: &Table, path: &str) -> usize {
    table
        .columns
        .iter()
        .filter(|c| c.is_index && c.field_path == path)
        .count()
}

/// Element type previously committed at `level`
fn prior_element_type(table: &Table, path: &str, level: usize) -> SqlType {
    let levels = recorded_levels(table, path);
    if levels <= level {
        SqlType::Null
    } else if levels > level + 1 {
        SqlType::Array
    } else if let Some(value) = table.field_column(path) {
        value.sql_type
    } else {
        SqlType::Object
    }
}

impl Flattener {
    /// Flatten `array`, found at `path`, at nesting `level`
    ///
    /// Level 0 is the array field itself; nested arrays reuse the same table
    /// with one more index column per level.
    pub(crate) fn flatten_array(
        &mut self,
        array: &[Value],
        chain: &ForeignKeyChain,
        path: &str,
        level: usize,
    ) -> Result<(), InferenceError> {
        let table_name = self.table_name(path)?;
        let index_name = self.index_column_name(path, level)?;
        let value_name = self.name(VALUE_COLUMN_NAME)?;

        let prior = self
            .tables
            .get(&table_name)
            .map(|t| prior_element_type(t, path, level))
            .unwrap_or(SqlType::Null);
        self.ensure_table(&table_name, path, TableShape::Array, chain);
        self.ensure_index(&table_name, &index_name, path);

        let mut unified = array
            .iter()
            .fold(prior, |acc, element| promote(acc, element.kind()));
        self.note_promotion(path, prior, unified);

        if !unified.is_complex() {
            match prior {
                SqlType::Object => {
                    debug!(table = %table_name, level, "Array elements collapsed to scalars");
                    self.reseed(&table_name, &index_name, path, chain);
                }
                SqlType::Array => {
                    debug!(table = %table_name, level, "Array nesting depth conflict");
                    self.stats.depth_conflicts += 1;
                    self.reseed(&table_name, &index_name, path, chain);
                    unified = SqlType::Varchar;
                }
                _ => {}
            }
        }

        match unified {
            SqlType::Object => {
                self.remove_placeholder(&table_name, path);
                let element_chain = self.chain_through_level(&table_name, path, level);
                for element in array {
                    if let Value::Document(document) = element {
                        self.flatten_document(document, &element_chain, path, false)?;
                    }
                }
            }
            SqlType::Array => {
                let element_chain = self.chain_through_level(&table_name, path, level);
                for element in array {
                    if let Value::Array(items) = element {
                        self.flatten_array(items, &element_chain, path, level + 1)?;
                    }
                }
            }
            _ => {
                let source_kind = match array.last() {
                    Some(element) => element.kind(),
                    None => self
                        .tables
                        .get(&table_name)
                        .and_then(|t| t.field_column(path))
                        .map(|c| c.source_kind)
                        .unwrap_or(ValueKind::Null),
                };
                self.upsert_column(
                    &table_name,
                    Column::new(path, value_name, unified, source_kind),
                );
            }
        }

        Ok(())
    }

    pub(super) fn index_column_name(
        &mut self,
        path: &str,
        level: usize,
    ) -> Result<String, InferenceError> {
        let array_path = combine_path(&self.collection, path);
        let full = combine_path(&array_path, &format!("{}{}", INDEX_COLUMN_PREFIX, level));
        self.name(&full)
    }

    fn ensure_index(&mut self, table_name: &str, index_name: &str, path: &str) {
        if let Some(table) = self.tables.get_mut(table_name)
            && !table.has_column(index_name)
        {
            let position = table.primary_key_len() + 1;
            table.push_column(Column::index(path, index_name, position));
        }
    }

    /// Replace the array's table with a fresh one holding only its key columns
    fn reseed(&mut self, table_name: &str, index_name: &str, path: &str, chain: &ForeignKeyChain) {
        self.discard_subtree(path);
        self.ensure_table(table_name, path, TableShape::Array, chain);
        self.ensure_index(table_name, index_name, path);
    }

    /// Key of the array table as seen by elements at `level`
    ///
    /// Index columns of deeper levels are left out.
    fn chain_through_level(&self, table_name: &str, path: &str, level: usize) -> ForeignKeyChain {
        let Some(table) = self.tables.get(table_name) else {
            return ForeignKeyChain::new();
        };

        let mut levels = 0;
        let columns = table.primary_key().into_iter().filter(|c| {
            if c.is_index && c.field_path == path {
                levels += 1;
                levels <= level + 1
            } else {
                true
            }
        });
        ForeignKeyChain::from_columns(table_name, columns)
    }
}
