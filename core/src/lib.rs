//! Indexing and retrieval engine for a crawled movie-metadata corpus.
//!
//! The crate builds multi-field inverted indexes over movie records,
//! ranks documents against queries with Vector-Space-Model and Okapi
//! BM25 scoring, supports approximate retrieval through a tiered index,
//! and detects near-duplicate documents with MinHash/LSH. Index state
//! is serialized to flat JSON files, one per (field, kind) pair.

pub mod document;
pub mod engine;
pub mod error;
pub mod field;
pub mod index;
pub mod lsh;
pub mod persist;
pub mod scorer;
pub mod stats;
pub mod tiered;
pub mod tokenizer;

pub use document::Document;
pub use engine::{SearchEngine, TierStop};
pub use error::{Result, SearchError};
pub use field::Field;
pub use index::{InvertedIndex, Postings};
pub use scorer::{Scoring, VsmScheme};
pub use tiered::{TierPolicy, TieredIndex};
