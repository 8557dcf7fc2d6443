use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::field::Field;
use crate::index::{InvertedIndex, Postings};
use crate::persist::IndexPaths;
use crate::scorer::{Scorer, Scoring};
use crate::stats::{document_lengths, DocumentLengths, Metadata};
use crate::tiered::{TierPolicy, TieredIndex};
use crate::tokenizer;

/// When the unsafe (tiered) path stops descending into lower tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierStop {
    /// Each weighted field scans tiers until its own candidate count
    /// reaches the result cap.
    #[default]
    PerField,
    /// Tier descent stops once the union of candidates across all
    /// weighted fields reaches the cap.
    Aggregate,
}

/// Query orchestration over the inverted index and its derived tables.
///
/// Queries are read-only against the held snapshot. `add`/`remove`
/// rebuild the derived tables before returning, so a caller serializing
/// mutation externally always queries consistent state.
#[derive(Debug)]
pub struct SearchEngine {
    index: InvertedIndex,
    tiered: HashMap<Field, TieredIndex>,
    lengths: HashMap<Field, DocumentLengths>,
    metadata: Metadata,
    policy: TierPolicy,
    tier_stop: TierStop,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex) -> Self {
        Self::with_policy(index, TierPolicy::default())
    }

    pub fn with_policy(index: InvertedIndex, policy: TierPolicy) -> Self {
        let mut engine = Self {
            index,
            tiered: HashMap::new(),
            lengths: HashMap::new(),
            metadata: Metadata::default(),
            policy,
            tier_stop: TierStop::default(),
        };
        engine.refresh();
        engine
    }

    pub fn tier_stop(mut self, tier_stop: TierStop) -> Self {
        self.tier_stop = tier_stop;
        self
    }

    /// Restores an engine from serialized index files.
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let index = crate::persist::load_index(paths)?;
        let mut tiered = HashMap::new();
        let mut lengths = HashMap::new();
        for field in Field::ALL {
            tiered.insert(field, crate::persist::load_tiered(paths, field)?);
            lengths.insert(field, crate::persist::load_lengths(paths, field)?);
        }
        let metadata = crate::persist::load_metadata(paths)?;
        Ok(Self {
            index,
            tiered,
            lengths,
            metadata,
            policy: TierPolicy::default(),
            tier_stop: TierStop::default(),
        })
    }

    /// Writes every index file under the given directory.
    pub fn store(&self, paths: &IndexPaths) -> Result<()> {
        crate::persist::store_index(paths, &self.index)?;
        for field in Field::ALL {
            crate::persist::store_tiered(paths, field, &self.tiered[&field])?;
            crate::persist::store_lengths(paths, field, &self.lengths[&field])?;
        }
        crate::persist::store_metadata(paths, &self.metadata)?;
        tracing::info!(root = %paths.root.display(), "stored index files");
        Ok(())
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_created_at(&mut self, stamp: String) {
        self.metadata.created_at = stamp;
    }

    pub fn add(&mut self, document: crate::document::Document) {
        self.index.add(document);
        self.refresh();
    }

    pub fn remove(&mut self, document_id: &str) {
        self.index.remove(document_id);
        self.refresh();
    }

    fn refresh(&mut self) {
        let created_at = std::mem::take(&mut self.metadata.created_at);
        for field in Field::ALL {
            self.tiered
                .insert(field, TieredIndex::build(&self.index, field, &self.policy));
            self.lengths.insert(field, document_lengths(&self.index, field));
        }
        self.metadata = Metadata::from_index(&self.index);
        self.metadata.created_at = created_at;
    }

    /// Ranks documents for a raw query string.
    ///
    /// Safe ranking scores each weighted field against its complete
    /// posting. Unsafe ranking scans tiers richest-first and may
    /// exclude documents living only in unexamined lower tiers; it is a
    /// deliberate approximation and may disagree with the safe path.
    /// Per-field scores are combined as `sum(score * weight)` with a
    /// missing field score contributing 0. Results are sorted by
    /// descending score, ties broken by ascending document id, then
    /// truncated to `max_results` (`None` means no truncation).
    pub fn search(
        &self,
        query: &str,
        scoring: Scoring,
        weights: &HashMap<Field, f64>,
        safe_ranking: bool,
        max_results: Option<usize>,
    ) -> Vec<(String, f64)> {
        let terms = tokenizer::tokenize(query);
        if terms.is_empty() || weights.is_empty() {
            return Vec::new();
        }
        tracing::debug!(?terms, %scoring, safe_ranking, "scoring query");

        let per_field = if safe_ranking {
            self.safe_scores(&terms, scoring, weights)
        } else {
            self.tiered_scores(&terms, scoring, weights, max_results)
        };

        let mut aggregate: HashMap<String, f64> = HashMap::new();
        for (field, weight) in weights {
            let Some(scores) = per_field.get(field) else {
                continue;
            };
            for (id, score) in scores {
                *aggregate.entry(id.clone()).or_insert(0.0) += score * weight;
            }
        }

        let mut ranked: Vec<(String, f64)> = aggregate.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        if let Some(cap) = max_results {
            ranked.truncate(cap);
        }
        ranked
    }

    fn safe_scores(
        &self,
        terms: &[String],
        scoring: Scoring,
        weights: &HashMap<Field, f64>,
    ) -> HashMap<Field, HashMap<String, f64>> {
        weights
            .keys()
            .map(|&field| {
                let scores = self.score_postings(field, self.index.postings(field), terms, scoring);
                (field, scores)
            })
            .collect()
    }

    fn tiered_scores(
        &self,
        terms: &[String],
        scoring: Scoring,
        weights: &HashMap<Field, f64>,
        max_results: Option<usize>,
    ) -> HashMap<Field, HashMap<String, f64>> {
        let cap = max_results.unwrap_or(usize::MAX);
        let mut per_field: HashMap<Field, HashMap<String, f64>> = HashMap::new();
        match self.tier_stop {
            TierStop::PerField => {
                for &field in weights.keys() {
                    let mut accumulated: HashMap<String, f64> = HashMap::new();
                    for tier in self.tiered[&field].tiers() {
                        if accumulated.len() >= cap {
                            break;
                        }
                        merge_scores(
                            &mut accumulated,
                            self.score_postings(field, tier, terms, scoring),
                        );
                    }
                    per_field.insert(field, accumulated);
                }
            }
            TierStop::Aggregate => {
                let depth = weights
                    .keys()
                    .map(|field| self.tiered[field].tier_count())
                    .max()
                    .unwrap_or(0);
                let mut seen: HashSet<String> = HashSet::new();
                for level in 0..depth {
                    if seen.len() >= cap {
                        break;
                    }
                    for &field in weights.keys() {
                        let Some(tier) = self.tiered[&field].tier(level) else {
                            continue;
                        };
                        let scores = self.score_postings(field, tier, terms, scoring);
                        seen.extend(scores.keys().cloned());
                        merge_scores(per_field.entry(field).or_default(), scores);
                    }
                }
                for &field in weights.keys() {
                    per_field.entry(field).or_default();
                }
            }
        }
        per_field
    }

    fn score_postings(
        &self,
        field: Field,
        postings: &Postings,
        terms: &[String],
        scoring: Scoring,
    ) -> HashMap<String, f64> {
        let scorer = Scorer::new(postings, self.metadata.document_count);
        match scoring {
            Scoring::Vsm { doc, query } => scorer.vsm(terms, doc, query),
            Scoring::OkapiBm25 => scorer.bm25(
                terms,
                self.metadata.average_length(field),
                &self.lengths[&field],
            ),
        }
    }
}

fn merge_scores(accumulated: &mut HashMap<String, f64>, scores: HashMap<String, f64>) {
    for (id, score) in scores {
        *accumulated.entry(id).or_insert(0.0) += score;
    }
}
