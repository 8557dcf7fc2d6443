use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;
use crate::index::Postings;
use crate::stats::DocumentLengths;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;

/// Document-frequency fallback for terms absent from the index, so
/// `ln(N / df)` stays finite for out-of-vocabulary query terms.
pub const UNSEEN_DF: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TfWeight {
    /// Raw term frequency (`n`).
    Natural,
    /// `ln(tf) + 1` (`l`).
    Logarithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdfWeight {
    /// No idf component (`n`).
    None,
    /// `ln(N / df)` (`t`).
    Idf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// No normalization (`n`).
    None,
    /// Unit-L2 (cosine) normalization (`c`).
    Cosine,
}

/// One SMART-notation half: tf weighting, idf weighting, normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VsmScheme {
    pub tf: TfWeight,
    pub idf: IdfWeight,
    pub norm: Normalization,
}

impl FromStr for VsmScheme {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SearchError::InvalidMethod(s.to_string());
        let mut chars = s.chars();
        let (Some(t), Some(d), Some(n), None) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(invalid());
        };
        Ok(VsmScheme {
            tf: match t {
                'n' => TfWeight::Natural,
                'l' => TfWeight::Logarithm,
                _ => return Err(invalid()),
            },
            idf: match d {
                'n' => IdfWeight::None,
                't' => IdfWeight::Idf,
                _ => return Err(invalid()),
            },
            norm: match n {
                'n' => Normalization::None,
                'c' => Normalization::Cosine,
                _ => return Err(invalid()),
            },
        })
    }
}

impl fmt::Display for VsmScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match self.tf {
            TfWeight::Natural => 'n',
            TfWeight::Logarithm => 'l',
        };
        let d = match self.idf {
            IdfWeight::None => 'n',
            IdfWeight::Idf => 't',
        };
        let n = match self.norm {
            Normalization::None => 'n',
            Normalization::Cosine => 'c',
        };
        write!(f, "{t}{d}{n}")
    }
}

/// Scoring method selector. Parses `"OkapiBM25"` or a SMART pair such
/// as `"lnc.ltc"` (document half, dot, query half); anything else is a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    Vsm { doc: VsmScheme, query: VsmScheme },
    OkapiBm25,
}

impl FromStr for Scoring {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "OkapiBM25" {
            return Ok(Scoring::OkapiBm25);
        }
        let Some((doc, query)) = s.split_once('.') else {
            return Err(SearchError::InvalidMethod(s.to_string()));
        };
        Ok(Scoring::Vsm {
            doc: doc.parse().map_err(|_| SearchError::InvalidMethod(s.to_string()))?,
            query: query.parse().map_err(|_| SearchError::InvalidMethod(s.to_string()))?,
        })
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::Vsm { doc, query } => write!(f, "{doc}.{query}"),
            Scoring::OkapiBm25 => f.write_str("OkapiBM25"),
        }
    }
}

/// Stateless-per-call ranking over a single field's postings.
///
/// The query arrives already tokenized, duplicates preserved. Documents
/// containing none of the query terms are absent from every result map,
/// not scored zero.
pub struct Scorer<'a> {
    postings: &'a Postings,
    document_count: usize,
}

impl<'a> Scorer<'a> {
    pub fn new(postings: &'a Postings, document_count: usize) -> Self {
        Self { postings, document_count }
    }

    fn df(&self, term: &str) -> f64 {
        self.postings
            .get(term)
            .map(|docs| docs.len() as f64)
            .unwrap_or(UNSEEN_DF)
    }

    /// `ln(N / df)` with the unseen-term fallback.
    pub fn idf_weight(&self, term: &str) -> f64 {
        (self.document_count as f64 / self.df(term)).ln()
    }

    /// Vector-space-model scores under independently chosen document
    /// and query schemes. Document cosine norms are taken over the
    /// document's full term vector in this field, not just the query
    /// terms, matching the exhaustive formulation.
    pub fn vsm(
        &self,
        query: &[String],
        doc_scheme: VsmScheme,
        query_scheme: VsmScheme,
    ) -> HashMap<String, f64> {
        let mut scores: HashMap<String, f64> = HashMap::new();
        if query.is_empty() || self.document_count == 0 {
            return scores;
        }

        let mut query_tf: HashMap<&str, u32> = HashMap::new();
        for term in query {
            *query_tf.entry(term.as_str()).or_insert(0) += 1;
        }

        let mut query_weights: HashMap<&str, f64> = HashMap::new();
        for (&term, &tf) in &query_tf {
            let mut weight = weigh_tf(tf, query_scheme.tf);
            if query_scheme.idf == IdfWeight::Idf {
                weight *= self.idf_weight(term);
            }
            query_weights.insert(term, weight);
        }
        if query_scheme.norm == Normalization::Cosine {
            let norm = query_weights.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for weight in query_weights.values_mut() {
                    *weight /= norm;
                }
            }
        }

        for (&term, &query_weight) in &query_weights {
            let Some(docs) = self.postings.get(term) else {
                continue;
            };
            for (id, &tf) in docs {
                let mut weight = weigh_tf(tf, doc_scheme.tf);
                if doc_scheme.idf == IdfWeight::Idf {
                    weight *= self.idf_weight(term);
                }
                *scores.entry(id.clone()).or_insert(0.0) += query_weight * weight;
            }
        }

        if doc_scheme.norm == Normalization::Cosine && !scores.is_empty() {
            let norms = self.document_norms(&scores, doc_scheme);
            for (id, score) in scores.iter_mut() {
                match norms.get(id) {
                    Some(&norm) if norm > 0.0 => *score /= norm,
                    _ => *score = 0.0,
                }
            }
        }
        scores
    }

    /// L2 norms of the candidates' full weighted term vectors.
    fn document_norms(
        &self,
        candidates: &HashMap<String, f64>,
        scheme: VsmScheme,
    ) -> HashMap<String, f64> {
        let mut norms: HashMap<String, f64> = HashMap::new();
        for (term, docs) in self.postings {
            let idf = match scheme.idf {
                IdfWeight::Idf => self.idf_weight(term),
                IdfWeight::None => 1.0,
            };
            for (id, &tf) in docs {
                if !candidates.contains_key(id) {
                    continue;
                }
                let weight = weigh_tf(tf, scheme.tf) * idf;
                *norms.entry(id.clone()).or_insert(0.0) += weight * weight;
            }
        }
        for norm in norms.values_mut() {
            *norm = norm.sqrt();
        }
        norms
    }

    /// Okapi BM25 with fixed `k1 = 1.5`, `b = 0.75`. Each query term
    /// occurrence contributes, so query term frequency matters.
    pub fn bm25(
        &self,
        query: &[String],
        average_length: f64,
        lengths: &DocumentLengths,
    ) -> HashMap<String, f64> {
        let mut scores: HashMap<String, f64> = HashMap::new();
        if query.is_empty() || self.document_count == 0 {
            return scores;
        }
        for term in query {
            let idf = self.idf_weight(term);
            let Some(docs) = self.postings.get(term.as_str()) else {
                continue;
            };
            for (id, &tf) in docs {
                let length = lengths.get(id).copied().unwrap_or(0) as f64;
                let ratio = if average_length > 0.0 { length / average_length } else { 0.0 };
                let tf = f64::from(tf);
                let saturated =
                    ((BM25_K1 + 1.0) * tf) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * ratio));
                *scores.entry(id.clone()).or_insert(0.0) += idf * saturated;
            }
        }
        scores
    }
}

fn weigh_tf(tf: u32, weight: TfWeight) -> f64 {
    match weight {
        TfWeight::Natural => f64::from(tf),
        TfWeight::Logarithm => f64::from(tf).ln() + 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(entries: &[(&str, &[(&str, u32)])]) -> Postings {
        entries
            .iter()
            .map(|(term, docs)| {
                (
                    term.to_string(),
                    docs.iter().map(|(id, tf)| (id.to_string(), *tf)).collect(),
                )
            })
            .collect()
    }

    fn query(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parses_scoring_selectors() {
        assert_eq!("OkapiBM25".parse::<Scoring>().unwrap(), Scoring::OkapiBm25);
        let Scoring::Vsm { doc, query } = "lnc.ltc".parse::<Scoring>().unwrap() else {
            panic!("expected VSM");
        };
        assert_eq!(doc.to_string(), "lnc");
        assert_eq!(query.to_string(), "ltc");
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "lnc", "lnc.lt", "xnc.ltc", "okapibm25", "lnc.ltc.ltc"] {
            assert!(
                matches!(bad.parse::<Scoring>(), Err(SearchError::InvalidMethod(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn idf_weight_is_monotone_in_df() {
        let postings = posting(&[
            ("rare", &[("d1", 1)]),
            ("common", &[("d1", 1), ("d2", 1), ("d3", 1)]),
        ]);
        let scorer = Scorer::new(&postings, 4);
        assert!(scorer.idf_weight("rare") >= scorer.idf_weight("common"));
        // Unseen terms use the fallback df and stay finite.
        assert!(scorer.idf_weight("absent").is_finite());
        assert!(scorer.idf_weight("absent") >= scorer.idf_weight("rare"));
    }

    #[test]
    fn bm25_matches_closed_form() {
        let postings = posting(&[("hope", &[("d1", 2), ("d2", 1)])]);
        let scorer = Scorer::new(&postings, 2);
        let lengths: DocumentLengths =
            [("d1".to_string(), 4), ("d2".to_string(), 8)].into_iter().collect();
        let scores = scorer.bm25(&query(&["hope"]), 6.0, &lengths);

        let idf = (2.0f64 / 2.0).ln();
        let d1 = idf * ((BM25_K1 + 1.0) * 2.0)
            / (2.0 + BM25_K1 * (1.0 - BM25_B + BM25_B * 4.0 / 6.0));
        let d2 = idf * ((BM25_K1 + 1.0) * 1.0)
            / (1.0 + BM25_K1 * (1.0 - BM25_B + BM25_B * 8.0 / 6.0));
        assert!((scores["d1"] - d1).abs() < 1e-9);
        assert!((scores["d2"] - d2).abs() < 1e-9);
    }

    #[test]
    fn bm25_prefers_higher_tf_shorter_doc() {
        let postings = posting(&[("hope", &[("d1", 2), ("d2", 1)]), ("x", &[("d3", 1)])]);
        let scorer = Scorer::new(&postings, 3);
        let lengths: DocumentLengths = [
            ("d1".to_string(), 4),
            ("d2".to_string(), 8),
            ("d3".to_string(), 1),
        ]
        .into_iter()
        .collect();
        let scores = scorer.bm25(&query(&["hope"]), 6.0, &lengths);
        assert!(scores["d1"] > scores["d2"]);
        assert!(!scores.contains_key("d3"));
    }

    #[test]
    fn vsm_scores_only_matching_documents() {
        let postings = posting(&[
            ("prison", &[("d1", 2)]),
            ("escape", &[("d1", 1), ("d2", 1)]),
            ("other", &[("d3", 5)]),
        ]);
        let scorer = Scorer::new(&postings, 3);
        let scoring: Scoring = "lnc.ltc".parse().unwrap();
        let Scoring::Vsm { doc, query: q } = scoring else { unreachable!() };
        let scores = scorer.vsm(&query(&["prison", "escape"]), doc, q);
        assert!(scores.contains_key("d1"));
        assert!(scores.contains_key("d2"));
        assert!(!scores.contains_key("d3"));
        assert!(scores["d1"] > scores["d2"]);
    }

    #[test]
    fn empty_query_and_oov_query_yield_empty_rankings() {
        let postings = posting(&[("prison", &[("d1", 2)])]);
        let scorer = Scorer::new(&postings, 1);
        let scheme: VsmScheme = "lnc".parse().unwrap();
        assert!(scorer.vsm(&[], scheme, scheme).is_empty());
        assert!(scorer.vsm(&query(&["unknown"]), scheme, scheme).is_empty());
        assert!(scorer.bm25(&[], 1.0, &DocumentLengths::new()).is_empty());
        assert!(scorer
            .bm25(&query(&["unknown"]), 1.0, &DocumentLengths::new())
            .is_empty());
    }
}
