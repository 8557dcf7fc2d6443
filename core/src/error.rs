use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the indexing and retrieval engine.
///
/// Configuration mistakes (bad field name, bad scoring method) fail
/// fast. Load-side data problems distinguish a missing index file from
/// one that exists but cannot be parsed, so the caller can decide
/// between rebuilding and aborting. Query-time absence (unknown term,
/// empty query) is never an error; those cases resolve to empty
/// results in the respective APIs.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("index file not found: {path}")]
    IndexFileMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("index file corrupt: {path}")]
    IndexFileCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid field name: {0:?}")]
    InvalidField(String),

    #[error("invalid scoring method: {0:?}")]
    InvalidMethod(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
