//! Schema inference engine for document collections
//!
//! Samples documents from one collection and projects them onto normalized
//! relational tables.
//!
//! ## Features
//!
//! - **Type lattice** - Column types only ever widen, toward VARCHAR
//! - **Virtual tables** - Nested objects and arrays get their own tables
//! - **Key inheritance** - Virtual tables carry their ancestors' keys as foreign keys
//! - **Bounded identifiers** - Long paths are shortened to unique SQL names
//!
//! ## Example
//!
//! ```rust
//! use docdb_schema::inference::{InferenceConfig, SchemaGenerator};
//!
//! let config = InferenceConfig::builder().sample_size(100).build();
//! let mut generator = SchemaGenerator::with_config("orders", config);
//!
//! generator.add_json(r#"{"_id": {"$oid": "65a1b2c3d4e5f60718293a4b"}, "items": [{"sku": "A1"}]}"#)?;
//!
//! let schema = generator.finalize();
//! let items = schema.table("orders_items").unwrap();
//! assert_eq!(items.primary_key().len(), 2);
//! # Ok::<(), docdb_schema::inference::InferenceError>(())
//! ```

mod array;
mod config;
mod document;
mod error;
mod inferrer;
mod naming;
mod types;

pub use array::{INDEX_COLUMN_PREFIX, VALUE_COLUMN_NAME};
pub use config::{
    DEFAULT_ID_FIELD, DEFAULT_MAX_IDENTIFIER_LENGTH, InferenceConfig, InferenceConfigBuilder,
};
pub use document::{ForeignKeyChain, KeyColumn};
pub use error::{InferenceError, InferenceResult};
pub use inferrer::{
    InferenceStats, SchemaGenerator, generate, generate_with_config, try_generate,
};
pub use naming::{IdentifierNamer, NAME_SEPARATOR, PATH_SEPARATOR, combine_path};
pub use types::{SqlType, collapses, promote, promote_key};
