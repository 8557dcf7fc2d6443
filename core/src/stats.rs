use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::index::InvertedIndex;

/// Document id -> total token count in one field.
pub type DocumentLengths = HashMap<String, u32>;

/// Derives per-document field lengths by summing tf over the field's
/// postings. Documents with nothing in the field get length 0.
pub fn document_lengths(index: &InvertedIndex, field: Field) -> DocumentLengths {
    let mut lengths = DocumentLengths::new();
    for docs in index.postings(field).values() {
        for (id, &tf) in docs {
            *lengths.entry(id.clone()).or_insert(0) += tf;
        }
    }
    for id in index.documents().keys() {
        lengths.entry(id.clone()).or_insert(0);
    }
    lengths
}

/// Corpus-wide aggregates the scorers depend on. A derived view:
/// recompute after any index mutation before querying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub document_count: usize,
    pub average_document_length: HashMap<Field, f64>,
    #[serde(default)]
    pub created_at: String,
}

impl Metadata {
    pub fn from_index(index: &InvertedIndex) -> Self {
        let count = index.document_count();
        let mut average = HashMap::new();
        for field in Field::ALL {
            let total: u64 = document_lengths(index, field)
                .values()
                .map(|&len| u64::from(len))
                .sum();
            let avg = if count == 0 { 0.0 } else { total as f64 / count as f64 };
            average.insert(field, avg);
        }
        Self {
            document_count: count,
            average_document_length: average,
            created_at: String::new(),
        }
    }

    pub fn average_length(&self, field: Field) -> f64 {
        self.average_document_length.get(&field).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn corpus() -> InvertedIndex {
        InvertedIndex::build(vec![
            Document {
                id: "tt1".into(),
                title: String::new(),
                stars: vec!["tim robbins".into()],
                genres: vec!["drama".into()],
                summaries: vec!["prison escape hope prison".into()],
            },
            Document {
                id: "tt2".into(),
                title: String::new(),
                stars: vec![],
                genres: vec!["crime".into()],
                summaries: vec!["detective hunt".into()],
            },
        ])
    }

    #[test]
    fn lengths_match_direct_token_count() {
        let index = corpus();
        let lengths = document_lengths(&index, Field::Summaries);
        assert_eq!(lengths["tt1"], 4);
        assert_eq!(lengths["tt2"], 2);
        // tt2 has no stars: present with length 0, not missing.
        assert_eq!(document_lengths(&index, Field::Stars)["tt2"], 0);
    }

    #[test]
    fn metadata_averages_over_all_documents() {
        let meta = Metadata::from_index(&corpus());
        assert_eq!(meta.document_count, 2);
        assert!((meta.average_length(Field::Summaries) - 3.0).abs() < 1e-12);
        assert!((meta.average_length(Field::Stars) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_corpus_average_is_zero() {
        let meta = Metadata::from_index(&InvertedIndex::new());
        assert_eq!(meta.document_count, 0);
        assert_eq!(meta.average_length(Field::Genres), 0.0);
    }
}
