use serde::{Deserialize, Serialize};

use crate::field::Field;

/// One crawled movie record.
///
/// The token fields hold pre-normalized text: each list entry is a
/// string of whitespace-separated terms as produced by the tokenizer
/// (multi-word star names, whole summary sentences). Unknown fields in
/// the crawled JSON are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub stars: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub summaries: Vec<String>,
}

impl Document {
    pub fn values(&self, field: Field) -> &[String] {
        match field {
            Field::Stars => &self.stars,
            Field::Genres => &self.genres,
            Field::Summaries => &self.summaries,
        }
    }

    /// Individual index terms of a field: every list entry split on
    /// whitespace, duplicates preserved.
    pub fn terms(&self, field: Field) -> impl Iterator<Item = &str> {
        self.values(field).iter().flat_map(|v| v.split_whitespace())
    }
}
