use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::field::Field;

/// Term -> (document id -> term frequency). A present entry always has
/// `tf >= 1`; absence means the term does not occur in the document.
pub type Postings = HashMap<String, HashMap<String, u32>>;

/// Multi-field inverted index plus the full-record document table.
///
/// The four sub-indexes stay mutually consistent under mutation: a
/// document id appears in the record table iff it contributes every
/// posting that mentions it, and removing a document after adding it
/// restores the exact prior state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    docs: HashMap<String, Document>,
    stars: Postings,
    genres: Postings,
    summaries: Postings,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds all sub-indexes from a batch in one pass.
    pub fn build(documents: Vec<Document>) -> Self {
        let mut index = Self::new();
        for document in documents {
            index.add(document);
        }
        tracing::info!(
            documents = index.document_count(),
            summary_terms = index.summaries.len(),
            "built inverted index"
        );
        index
    }

    /// Reassembles an index from separately serialized parts.
    pub fn from_parts(
        docs: HashMap<String, Document>,
        stars: Postings,
        genres: Postings,
        summaries: Postings,
    ) -> Self {
        Self { docs, stars, genres, summaries }
    }

    pub fn postings(&self, field: Field) -> &Postings {
        match field {
            Field::Stars => &self.stars,
            Field::Genres => &self.genres,
            Field::Summaries => &self.summaries,
        }
    }

    fn postings_mut(&mut self, field: Field) -> &mut Postings {
        match field {
            Field::Stars => &mut self.stars,
            Field::Genres => &mut self.genres,
            Field::Summaries => &mut self.summaries,
        }
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.docs.contains_key(document_id)
    }

    pub fn get(&self, document_id: &str) -> Option<&Document> {
        self.docs.get(document_id)
    }

    pub fn documents(&self) -> &HashMap<String, Document> {
        &self.docs
    }

    /// Inserts a document into every sub-index. No-op if the id is
    /// already present.
    pub fn add(&mut self, document: Document) {
        if self.docs.contains_key(&document.id) {
            return;
        }
        for field in Field::ALL {
            let posting = self.postings_mut(field);
            for term in document.terms(field) {
                *posting
                    .entry(term.to_string())
                    .or_default()
                    .entry(document.id.clone())
                    .or_insert(0) += 1;
            }
        }
        self.docs.insert(document.id.clone(), document);
    }

    /// Removes a document from every sub-index, dropping term entries
    /// whose posting becomes empty. No-op if the id is absent.
    pub fn remove(&mut self, document_id: &str) {
        let Some(document) = self.docs.remove(document_id) else {
            return;
        };
        for field in Field::ALL {
            let posting = self.postings_mut(field);
            for term in document.terms(field) {
                if let Some(entry) = posting.get_mut(term) {
                    entry.remove(document_id);
                    if entry.is_empty() {
                        posting.remove(term);
                    }
                }
            }
        }
    }

    /// Document ids containing a term; empty for an unknown term.
    pub fn posting_list(&self, term: &str, field: Field) -> Vec<String> {
        self.postings(field)
            .get(term)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }
}
