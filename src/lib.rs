//! DocDB Schema - Relational schema inference for document collections
//!
//! Provides:
//! - Document value model and Extended JSON decoding
//! - Type lattice and column type promotion
//! - Flattening of nested objects and arrays into virtual tables
//! - Bounded, collision-free SQL identifier generation

pub mod document;
pub mod inference;
pub mod models;

// Re-export commonly used types
pub use document::{Document, Value, ValueKind};
pub use inference::{
    InferenceConfig, InferenceError, InferenceStats, SchemaGenerator, SqlType, generate,
    try_generate,
};

// Re-export models
pub use models::{CollectionSchema, Column, ForeignKey, Table, TableShape};
