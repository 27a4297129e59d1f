//! Models module
//!
//! Defines the relational structures produced by schema inference.

pub mod column;
pub mod schema;
pub mod table;

pub use column::{Column, ForeignKey};
pub use schema::CollectionSchema;
pub use table::{Table, TableShape};
