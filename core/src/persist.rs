use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::Document;
use crate::error::{Result, SearchError};
use crate::field::Field;
use crate::index::{InvertedIndex, Postings};
use crate::stats::{DocumentLengths, Metadata};
use crate::tiered::TieredIndex;

/// File layout of a serialized index: one JSON file per (field, kind).
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn documents(&self) -> PathBuf {
        self.root.join("documents_index.json")
    }

    pub fn postings(&self, field: Field) -> PathBuf {
        self.root.join(format!("{field}_index.json"))
    }

    pub fn tiered(&self, field: Field) -> PathBuf {
        self.root.join(format!("{field}_tiered_index.json"))
    }

    pub fn lengths(&self, field: Field) -> PathBuf {
        self.root.join(format!("{field}_document_lengths.json"))
    }

    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata_index.json")
    }
}

fn store<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(io::Error::from)?;
    Ok(())
}

/// A missing file and an unparseable file are distinct, recoverable
/// errors; the caller decides rebuild-vs-abort.
fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SearchError::IndexFileMissing { path: path.to_path_buf(), source: e }
        } else {
            SearchError::Io(e)
        }
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SearchError::IndexFileCorrupt { path: path.to_path_buf(), source: e })
}

pub fn store_documents(paths: &IndexPaths, docs: &HashMap<String, Document>) -> Result<()> {
    store(&paths.documents(), docs)
}

pub fn load_documents(paths: &IndexPaths) -> Result<HashMap<String, Document>> {
    load(&paths.documents())
}

pub fn store_postings(paths: &IndexPaths, field: Field, postings: &Postings) -> Result<()> {
    store(&paths.postings(field), postings)
}

pub fn load_postings(paths: &IndexPaths, field: Field) -> Result<Postings> {
    load(&paths.postings(field))
}

pub fn store_tiered(paths: &IndexPaths, field: Field, tiered: &TieredIndex) -> Result<()> {
    store(&paths.tiered(field), tiered)
}

pub fn load_tiered(paths: &IndexPaths, field: Field) -> Result<TieredIndex> {
    load(&paths.tiered(field))
}

pub fn store_lengths(paths: &IndexPaths, field: Field, lengths: &DocumentLengths) -> Result<()> {
    store(&paths.lengths(field), lengths)
}

pub fn load_lengths(paths: &IndexPaths, field: Field) -> Result<DocumentLengths> {
    load(&paths.lengths(field))
}

pub fn store_metadata(paths: &IndexPaths, metadata: &Metadata) -> Result<()> {
    store(&paths.metadata(), metadata)
}

pub fn load_metadata(paths: &IndexPaths) -> Result<Metadata> {
    load(&paths.metadata())
}

/// Stores the full-record table and every field's postings.
pub fn store_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    store_documents(paths, index.documents())?;
    for field in Field::ALL {
        store_postings(paths, field, index.postings(field))?;
    }
    Ok(())
}

/// Reloads the full-record table and per-field postings into an index
/// with behavior identical to the stored one.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let docs = load_documents(paths)?;
    let stars = load_postings(paths, Field::Stars)?;
    let genres = load_postings(paths, Field::Genres)?;
    let summaries = load_postings(paths, Field::Summaries)?;
    Ok(InvertedIndex::from_parts(docs, stars, genres, summaries))
}
