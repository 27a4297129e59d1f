//! Frozen result of an inference run

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::table::{Table, TableShape};

/// Relational projection of one collection
///
/// Built once by [`SchemaGenerator::finalize`](crate::inference::SchemaGenerator::finalize)
/// and read-only afterwards. Tables are keyed and ordered by SQL name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    collection_name: String,
    document_count: usize,
    created_at: DateTime<Utc>,
    tables: BTreeMap<String, Table>,
}

impl CollectionSchema {
    pub(crate) fn new(
        collection_name: String,
        document_count: usize,
        tables: BTreeMap<String, Table>,
    ) -> Self {
        Self {
            collection_name,
            document_count,
            created_at: Utc::now(),
            tables,
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Number of documents the schema was inferred from
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn tables(&self) -> &BTreeMap<String, Table> {
        &self.tables
    }

    pub fn table(&self, sql_name: &str) -> Option<&Table> {
        self.tables.get(sql_name)
    }

    pub fn table_by_id(&self, id: Uuid) -> Option<&Table> {
        self.tables.values().find(|t| t.id == id)
    }

    /// Tables for the given ids, skipping unknown ones
    pub fn tables_by_id(&self, ids: &[Uuid]) -> Vec<&Table> {
        ids.iter().filter_map(|id| self.table_by_id(*id)).collect()
    }

    /// The table holding the collection's own documents
    pub fn root_table(&self) -> Option<&Table> {
        self.tables
            .values()
            .find(|t| t.shape == TableShape::Collection)
    }

    /// Tables synthesized for nested objects and arrays
    pub fn virtual_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values().filter(|t| t.shape.is_virtual())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn into_tables(self) -> BTreeMap<String, Table> {
        self.tables
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ValueKind;
    use crate::inference::SqlType;
    use crate::models::Column;

    fn sample() -> CollectionSchema {
        let mut root = Table::new("orders", "orders", "", TableShape::Collection);
        let mut id = Column::new("_id", "orders__id", SqlType::Varchar, ValueKind::ObjectId);
        id.primary_key = 1;
        root.push_column(id);

        let items = Table::new("orders_items", "orders", "items", TableShape::Array);

        let mut tables = BTreeMap::new();
        tables.insert(root.sql_name.clone(), root);
        tables.insert(items.sql_name.clone(), items);
        CollectionSchema::new("orders".to_string(), 3, tables)
    }

    #[test]
    fn test_lookups() {
        let schema = sample();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.root_table().unwrap().sql_name, "orders");
        assert_eq!(schema.virtual_tables().count(), 1);

        let items_id = schema.table("orders_items").unwrap().id;
        assert_eq!(schema.table_by_id(items_id).unwrap().sql_name, "orders_items");
        assert_eq!(
            schema.tables_by_id(&[items_id, Uuid::nil()]).len(),
            1
        );
    }

    #[test]
    fn test_json_round_trip() {
        let schema = sample();
        let json = schema.to_json().unwrap();
        assert!(json.contains("\"collectionName\": \"orders\""));

        let parsed: CollectionSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_yaml_output() {
        let yaml = sample().to_yaml().unwrap();
        assert!(yaml.contains("collectionName: orders"));
        assert!(yaml.contains("sqlName: orders__id"));
    }
}
