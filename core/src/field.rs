use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// The closed set of indexed token fields.
///
/// The full-record document table is addressed separately; it is not a
/// token field and carries no postings of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Stars,
    Genres,
    Summaries,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Stars, Field::Genres, Field::Summaries];

    pub fn name(self) -> &'static str {
        match self {
            Field::Stars => "stars",
            Field::Genres => "genres",
            Field::Summaries => "summaries",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stars" => Ok(Field::Stars),
            "genres" => Ok(Field::Genres),
            "summaries" => Ok(Field::Summaries),
            other => Err(SearchError::InvalidField(other.to_string())),
        }
    }
}
