//! Configuration for schema inference

use serde::{Deserialize, Serialize};

/// Default maximum length of generated table and column names
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 128;

/// Default name of the document identifier field
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Configuration for schema inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Maximum number of documents to read (0 = all)
    pub sample_size: usize,

    /// Maximum length of any generated table or column name
    pub max_identifier_length: usize,

    /// Root document field that becomes the primary key
    pub id_field: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 0, // All documents
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the sample size (0 = all documents)
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set the maximum identifier length (at least 1)
    pub fn max_identifier_length(mut self, length: usize) -> Self {
        self.config.max_identifier_length = length.max(1);
        self
    }

    /// Set the identifier field name
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.config.id_field = field.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}
