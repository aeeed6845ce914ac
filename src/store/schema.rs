use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;

/// Identifier of a text in the library, doubling as its filename stem
/// under the store's `texts/` directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextId(String);

impl TextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifetime practice totals, independent of any single text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileData {
    pub schema_version: u32,
    pub coins: u64,
    pub lines_completed: u64,
    /// Sum of committed line durations in seconds.
    pub line_seconds: f64,
    /// Sum of committed line accuracy percents; the mean is
    /// `accuracy_points / lines_completed`.
    pub accuracy_points: f64,
    pub texts_completed: u32,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            coins: 0,
            lines_completed: 0,
            line_seconds: 0.0,
            accuracy_points: 0.0,
            texts_completed: 0,
        }
    }
}

impl ProfileData {
    /// True when the file was written under a different schema version.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn mean_line_accuracy(&self) -> f64 {
        if self.lines_completed == 0 {
            100.0
        } else {
            self.accuracy_points / self.lines_completed as f64
        }
    }
}

/// One imported text and its per-text progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextRecord {
    pub id: TextId,
    pub title: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub progress_index: usize,
    #[serde(default)]
    pub times_completed: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryData {
    pub schema_version: u32,
    pub texts: Vec<TextRecord>,
}

impl Default for LibraryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            texts: Vec::new(),
        }
    }
}

impl LibraryData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
