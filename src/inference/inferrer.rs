//! Schema accumulator
//!
//! Feeds sampled documents through the flatteners and freezes the resulting
//! tables into a [`CollectionSchema`].

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::config::InferenceConfig;
use super::document::{Flattener, ForeignKeyChain};
use super::error::InferenceError;
use crate::document::Document;
use crate::models::{CollectionSchema, Table};

/// Schema generator that accumulates documents of one collection
///
/// # Example
///
/// ```rust
/// use docdb_schema::inference::SchemaGenerator;
///
/// let mut generator = SchemaGenerator::new("users");
/// generator.add_json(r#"{"_id": 1, "name": "Alice", "age": 30}"#).unwrap();
/// generator.add_json(r#"{"_id": 2, "name": "Bob", "tags": ["admin"]}"#).unwrap();
///
/// let schema = generator.finalize();
/// assert_eq!(schema.len(), 2);
/// assert!(schema.table("users_tags").is_some());
/// ```
pub struct SchemaGenerator {
    flattener: Flattener,
}

impl SchemaGenerator {
    /// Create a generator with default configuration
    pub fn new(collection: impl Into<String>) -> Self {
        Self::with_config(collection, InferenceConfig::default())
    }

    pub fn with_config(collection: impl Into<String>, config: InferenceConfig) -> Self {
        Self {
            flattener: Flattener::new(collection, config),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.flattener.collection
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.flattener.config
    }

    /// Add a document to the sample
    ///
    /// Documents beyond the configured sample size are ignored.
    pub fn add_document(&mut self, document: &Document) -> Result<(), InferenceError> {
        if self.is_full() {
            return Ok(());
        }

        self.flattener
            .flatten_document(document, &ForeignKeyChain::new(), "", true)?;
        self.flattener.stats.documents_processed += 1;
        trace!(
            documents = self.flattener.stats.documents_processed,
            tables = self.flattener.tables.len(),
            "Document processed"
        );
        Ok(())
    }

    /// Parse a JSON document (extended JSON wrappers allowed) and add it
    pub fn add_json(&mut self, json: &str) -> Result<(), InferenceError> {
        if self.is_full() {
            return Ok(());
        }
        let document = Document::from_json_str(json)?;
        self.add_document(&document)
    }

    /// Add several JSON documents
    pub fn add_json_batch(&mut self, documents: &[&str]) -> Result<(), InferenceError> {
        for json in documents {
            if self.is_full() {
                break;
            }
            self.add_json(json)?;
        }
        Ok(())
    }

    /// Whether the sample size has been reached
    pub fn is_full(&self) -> bool {
        let limit = self.flattener.config.sample_size;
        limit > 0 && self.flattener.stats.documents_processed >= limit
    }

    pub fn document_count(&self) -> usize {
        self.flattener.stats.documents_processed
    }

    /// Tables discovered so far
    pub fn tables(&self) -> &BTreeMap<String, Table> {
        &self.flattener.tables
    }

    pub fn stats(&self) -> InferenceStats {
        let tables = &self.flattener.tables;
        InferenceStats {
            tables_discovered: tables.len(),
            columns_discovered: tables.values().map(|t| t.columns.len()).sum(),
            ..self.flattener.stats.clone()
        }
    }

    /// Freeze the accumulated tables into a schema
    pub fn finalize(self) -> CollectionSchema {
        let stats = self.stats();
        info!(
            collection = %self.flattener.collection,
            documents = stats.documents_processed,
            tables = stats.tables_discovered,
            columns = stats.columns_discovered,
            "Schema inference complete"
        );
        debug!(
            type_demotions = stats.type_demotions,
            tables_discarded = stats.tables_discarded,
            depth_conflicts = stats.depth_conflicts,
            key_type_propagations = stats.key_type_propagations,
            "Inference statistics"
        );

        let Flattener {
            collection, tables, ..
        } = self.flattener;
        CollectionSchema::new(collection, stats.documents_processed, tables)
    }
}

/// Statistics about an inference run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    /// Documents flattened
    pub documents_processed: usize,
    /// Tables currently in the schema
    pub tables_discovered: usize,
    /// Columns across all current tables
    pub columns_discovered: usize,
    /// Columns or array elements widened to VARCHAR after a conflict
    pub type_demotions: usize,
    /// Virtual tables dropped because their field stopped being complex
    pub tables_discarded: usize,
    /// Arrays seen at conflicting nesting depths
    pub depth_conflicts: usize,
    /// Inherited key columns rewritten after the identifier type changed
    pub key_type_propagations: usize,
}

/// Infer a schema for `collection` from in-memory documents
///
/// # Errors
///
/// Fails when an identifier cannot be generated within the default length.
pub fn generate<I>(collection: &str, documents: I) -> Result<CollectionSchema, InferenceError>
where
    I: IntoIterator,
    I::Item: Borrow<Document>,
{
    generate_with_config(collection, InferenceConfig::default(), documents)
}

pub fn generate_with_config<I>(
    collection: &str,
    config: InferenceConfig,
    documents: I,
) -> Result<CollectionSchema, InferenceError>
where
    I: IntoIterator,
    I::Item: Borrow<Document>,
{
    let mut generator = SchemaGenerator::with_config(collection, config);
    for document in documents {
        if generator.is_full() {
            break;
        }
        generator.add_document(document.borrow())?;
    }
    Ok(generator.finalize())
}

/// Infer a schema from a fallible document cursor
///
/// The cursor is not pulled past the sample size. Cursor errors are returned
/// unchanged; inference errors are converted with `From`.
pub fn try_generate<I, E>(
    collection: &str,
    config: InferenceConfig,
    cursor: I,
) -> Result<CollectionSchema, E>
where
    I: IntoIterator<Item = Result<Document, E>>,
    E: From<InferenceError>,
{
    let mut generator = SchemaGenerator::with_config(collection, config);
    let mut cursor = cursor.into_iter();
    while !generator.is_full() {
        let Some(document) = cursor.next() else {
            break;
        };
        generator.add_document(&document?)?;
    }
    Ok(generator.finalize())
}
