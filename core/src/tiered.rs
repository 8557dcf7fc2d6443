use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::index::{InvertedIndex, Postings};

/// Tier split policy: per term, documents are ranked by descending
/// term frequency and divided into `tiers` near-equal rank slices
/// (ceiling division, so short posting lists fill the highest tiers
/// first and lower tiers stay empty).
#[derive(Debug, Clone)]
pub struct TierPolicy {
    pub tiers: usize,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self { tiers: 3 }
    }
}

/// A per-field posting partitioned into priority tiers.
///
/// Tier 0 holds each term's highest-tf documents. The tiers partition
/// every term's posting exactly: each (term, doc) pair lives in one
/// tier. Used only by the unsafe (approximate) ranking path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TieredIndex {
    tiers: Vec<Postings>,
}

impl TieredIndex {
    /// Pure function of an index snapshot; the index is not mutated.
    pub fn build(index: &InvertedIndex, field: Field, policy: &TierPolicy) -> Self {
        let count = policy.tiers.max(1);
        let mut tiers = vec![Postings::new(); count];
        for (term, docs) in index.postings(field) {
            let mut ranked: Vec<(&String, u32)> =
                docs.iter().map(|(id, &tf)| (id, tf)).collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            let slice = ranked.len().div_ceil(count).max(1);
            for (rank, (id, tf)) in ranked.into_iter().enumerate() {
                let tier = (rank / slice).min(count - 1);
                tiers[tier]
                    .entry(term.clone())
                    .or_default()
                    .insert(id.clone(), tf);
            }
        }
        Self { tiers }
    }

    pub fn from_tiers(tiers: Vec<Postings>) -> Self {
        Self { tiers }
    }

    pub fn tier(&self, level: usize) -> Option<&Postings> {
        self.tiers.get(level)
    }

    pub fn tiers(&self) -> &[Postings] {
        &self.tiers
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Same lookup contract as the full index, per tier.
    pub fn posting_list(&self, term: &str, level: usize) -> Vec<String> {
        self.tiers
            .get(level)
            .and_then(|tier| tier.get(term))
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }
}
