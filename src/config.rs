use std::{fs, num::NonZeroUsize, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{error::Result, schema::DataType};

/// How many realized rows the value-driven inference may look at.
///
/// `All` (the default) scans every realized row, so inference can never be
/// surprised by a value it did not sample. `Rows(n)` only samples the first
/// `n` rows; later values that do not fit raise a schema-ambiguity error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferSchemaLength {
    #[default]
    All,
    Rows(NonZeroUsize),
}

impl InferSchemaLength {
    pub fn rows(n: usize) -> Self {
        NonZeroUsize::new(n).map(InferSchemaLength::Rows).unwrap_or_default()
    }

    /// Number of rows to sample out of `total`.
    pub fn sample_len(&self, total: usize) -> usize {
        match self {
            InferSchemaLength::All => total,
            InferSchemaLength::Rows(n) => n.get().min(total),
        }
    }
}

impl From<Option<NonZeroUsize>> for InferSchemaLength {
    fn from(value: Option<NonZeroUsize>) -> Self {
        value.map(InferSchemaLength::Rows).unwrap_or_default()
    }
}

/// Whether the originating ORM configuration stores zone-aware timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeZoneSetting {
    Naive,
    Aware(String),
}

impl Default for TimeZoneSetting {
    fn default() -> Self {
        TimeZoneSetting::Aware("UTC".to_string())
    }
}

impl TimeZoneSetting {
    pub fn zone(&self) -> Option<&str> {
        match self {
            TimeZoneSetting::Naive => None,
            TimeZoneSetting::Aware(tz) => Some(tz),
        }
    }
}

/// Conversion settings.
///
/// - `infer_schema_length` bounds the sample used for columns without
///   declared metadata.
/// - `time_zone` decides whether datetime fields map to zoned timestamps.
/// - `schema_overrides` pins explicit types for named columns; these win
///   over both declared and inferred types.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub infer_schema_length: InferSchemaLength,
    pub time_zone: TimeZoneSetting,
    pub schema_overrides: IndexMap<String, DataType>,
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample at most `n` rows for inference; `0` means all rows.
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = InferSchemaLength::rows(n);
        self
    }

    pub fn with_time_zone(mut self, time_zone: TimeZoneSetting) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn naive(self) -> Self {
        self.with_time_zone(TimeZoneSetting::Naive)
    }

    pub fn with_override(mut self, column: &str, dtype: DataType) -> Self {
        self.schema_overrides.insert(column.to_string(), dtype);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
