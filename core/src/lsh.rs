use std::collections::{BTreeSet, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Signature value for a document with no shingles.
pub const EMPTY_SIGNATURE: u64 = u64::MAX;

/// Parameters for the offline near-duplicate analysis. Signatures and
/// buckets are rebuilt wholesale per run; nothing here is maintained
/// incrementally.
#[derive(Debug, Clone)]
pub struct LshParams {
    pub num_hashes: usize,
    pub shingle_size: usize,
    pub bands: usize,
    pub rows_per_band: usize,
    /// Fixed seed for reproducible permutations; `None` seeds from the
    /// host random source.
    pub seed: Option<u64>,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            num_hashes: 100,
            shingle_size: 2,
            bands: 10,
            rows_per_band: 10,
            seed: None,
        }
    }
}

/// Overlapping k-word shingles of a document.
pub fn shingle(text: &str, k: usize) -> HashSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut shingles = HashSet::new();
    if k == 0 || words.len() < k {
        return shingles;
    }
    for window in words.windows(k) {
        shingles.insert(window.join(" "));
    }
    shingles
}

/// Jaccard similarity of two shingle sets; 0.0 for an empty union.
pub fn jaccard(first: &HashSet<String>, second: &HashSet<String>) -> f64 {
    let union = first.union(second).count();
    if union == 0 {
        return 0.0;
    }
    first.intersection(second).count() as f64 / union as f64
}

/// MinHash/LSH near-duplicate detector.
pub struct MinHashLsh {
    params: LshParams,
}

impl MinHashLsh {
    pub fn new(params: LshParams) -> Self {
        Self { params }
    }

    fn rng(&self) -> StdRng {
        match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn shingle_sets(&self, documents: &[String]) -> Vec<HashSet<String>> {
        documents
            .iter()
            .map(|doc| shingle(doc, self.params.shingle_size))
            .collect()
    }

    /// Binary shingle-by-document membership over the de-duplicated
    /// corpus shingle universe. Rows follow the universe's sorted
    /// order so construction is deterministic.
    pub fn characteristic_matrix(&self, documents: &[String]) -> (Vec<String>, Vec<Vec<bool>>) {
        let sets = self.shingle_sets(documents);
        let universe: Vec<String> = sets
            .iter()
            .flat_map(|set| set.iter().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let matrix = universe
            .iter()
            .map(|shingle| sets.iter().map(|set| set.contains(shingle)).collect())
            .collect();
        (universe, matrix)
    }

    /// `num_hashes x num_documents` signature matrix: per permutation,
    /// each document's minimal permuted shingle rank.
    pub fn signatures(&self, documents: &[String]) -> Vec<Vec<u64>> {
        let sets = self.shingle_sets(documents);
        let universe: Vec<&String> = sets
            .iter()
            .flat_map(|set| set.iter())
            .collect::<BTreeSet<&String>>()
            .into_iter()
            .collect();
        let row_of: HashMap<&String, usize> =
            universe.iter().enumerate().map(|(row, s)| (*s, row)).collect();
        let doc_rows: Vec<Vec<usize>> = sets
            .iter()
            .map(|set| set.iter().map(|s| row_of[s]).collect())
            .collect();

        let mut rng = self.rng();
        let mut permutation: Vec<u64> = (0..universe.len() as u64).collect();
        let mut signatures = vec![vec![EMPTY_SIGNATURE; documents.len()]; self.params.num_hashes];
        for signature_row in signatures.iter_mut() {
            permutation.shuffle(&mut rng);
            for (doc, rows) in doc_rows.iter().enumerate() {
                signature_row[doc] = rows
                    .iter()
                    .map(|&row| permutation[row])
                    .min()
                    .unwrap_or(EMPTY_SIGNATURE);
            }
        }
        signatures
    }

    /// Buckets documents by exact banded signature agreement: two
    /// documents share a bucket iff their signatures match on every row
    /// of that band.
    pub fn buckets(&self, signatures: &[Vec<u64>]) -> HashMap<(usize, Vec<u64>), Vec<usize>> {
        let num_docs = signatures.first().map_or(0, |row| row.len());
        let mut buckets: HashMap<(usize, Vec<u64>), Vec<usize>> = HashMap::new();
        for band in 0..self.params.bands {
            let start = band * self.params.rows_per_band;
            let end = (start + self.params.rows_per_band).min(signatures.len());
            if start >= end {
                break;
            }
            for doc in 0..num_docs {
                let key: Vec<u64> = (start..end).map(|row| signatures[row][doc]).collect();
                buckets.entry((band, key)).or_default().push(doc);
            }
        }
        buckets
    }

    /// The whole pipeline: shingle, sign, band.
    pub fn detect(&self, documents: &[String]) -> HashMap<(usize, Vec<u64>), Vec<usize>> {
        let signatures = self.signatures(documents);
        let buckets = self.buckets(&signatures);
        tracing::debug!(
            documents = documents.len(),
            buckets = buckets.len(),
            "computed LSH buckets"
        );
        buckets
    }

    /// Statistical sanity check of detection quality, not a correctness
    /// oracle: a co-bucketed pair counts as correct when its true
    /// Jaccard similarity beats that of five random control documents.
    /// Returns the correct/total ratio, or 0.0 with no candidate pairs.
    pub fn evaluate(
        &self,
        buckets: &HashMap<(usize, Vec<u64>), Vec<usize>>,
        documents: &[String],
    ) -> f64 {
        let sets = self.shingle_sets(documents);
        let mut rng = self.rng();
        let trials = if documents.len() > 2 { 5 } else { 0 };

        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
        for docs in buckets.values() {
            let unique: BTreeSet<usize> = docs.iter().copied().collect();
            let members: Vec<usize> = unique.into_iter().collect();
            for (i, &first) in members.iter().enumerate() {
                for &second in &members[i + 1..] {
                    pairs.insert((first, second));
                }
            }
        }
        if pairs.is_empty() {
            return 0.0;
        }

        let mut correct = 0usize;
        for &(first, second) in &pairs {
            let pair_score = jaccard(&sets[first], &sets[second]);
            let mut wins = 0usize;
            for _ in 0..trials {
                let mut control = first;
                while control == first || control == second {
                    control = rng.random_range(0..documents.len());
                }
                if pair_score > jaccard(&sets[first], &sets[control]) {
                    wins += 1;
                }
            }
            if wins == trials {
                correct += 1;
            }
        }
        correct as f64 / pairs.len() as f64
    }
}
