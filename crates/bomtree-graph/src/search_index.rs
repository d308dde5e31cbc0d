//! Search index for fast substring matching.
//!
//! An inverted n-gram index over node names, part numbers and reference
//! designators. Text lookups touch only the candidates that share every
//! n-gram with the query instead of scanning the whole design.

use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

/// Minimum n-gram length for indexing.
const MIN_NGRAM_LEN: usize = 2;

/// Maximum n-gram length for indexing.
const MAX_NGRAM_LEN: usize = 4;

/// An inverted index for substring search.
///
/// Each term is broken into overlapping n-grams. A query is answered by
/// intersecting the postings of its own n-grams and then confirming the
/// substring match against the terms stored for each candidate.
#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    /// Lowercased terms per node, for confirming candidates.
    terms: HashMap<NodeIndex, Vec<String>>,
    /// Maps lowercased n-grams to the nodes containing them.
    ngram_index: HashMap<String, HashSet<NodeIndex>>,
}

impl SearchIndex {
    /// Creates a new empty search index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a term for a node. Empty terms are ignored.
    pub fn insert(&mut self, term: &str, slot: NodeIndex) {
        let lower = term.trim().to_lowercase();
        if lower.is_empty() {
            return;
        }

        for ngram in generate_ngrams(&lower) {
            self.ngram_index.entry(ngram).or_default().insert(slot);
        }
        self.terms.entry(slot).or_default().push(lower);
    }

    /// Finds nodes with a term containing `query`, case-insensitively.
    ///
    /// Queries shorter than the minimum n-gram length have no n-grams to
    /// look up and scan the stored terms instead. Results are sorted for
    /// deterministic output.
    pub fn search(&self, query: &str) -> Vec<NodeIndex> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Vec::new();
        }

        if query_lower.chars().count() < MIN_NGRAM_LEN {
            let mut results: Vec<NodeIndex> = self
                .terms
                .iter()
                .filter(|(_, terms)| terms.iter().any(|t| t.contains(&query_lower)))
                .map(|(&slot, _)| slot)
                .collect();
            results.sort();
            return results;
        }

        let mut candidates: Option<HashSet<NodeIndex>> = None;
        for ngram in generate_ngrams(&query_lower) {
            match self.ngram_index.get(&ngram) {
                Some(slots) => match &mut candidates {
                    None => candidates = Some(slots.clone()),
                    Some(c) => c.retain(|slot| slots.contains(slot)),
                },
                // An n-gram nobody has means no term can contain the query
                None => return Vec::new(),
            }
        }

        // n-gram intersection can have false positives
        let mut results: Vec<NodeIndex> = candidates
            .unwrap_or_default()
            .into_iter()
            .filter(|slot| {
                self.terms
                    .get(slot)
                    .is_some_and(|terms| terms.iter().any(|t| t.contains(&query_lower)))
            })
            .collect();

        results.sort();
        results
    }

    /// Returns the number of indexed nodes.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Generates n-grams for a lowercased string.
fn generate_ngrams(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut ngrams = Vec::new();

    for n in MIN_NGRAM_LEN..=MAX_NGRAM_LEN {
        if chars.len() >= n {
            for window in chars.windows(n) {
                ngrams.push(window.iter().collect());
            }
        }
    }

    ngrams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: usize) -> NodeIndex {
        NodeIndex::new(n)
    }

    #[test]
    fn test_search_substring() {
        let mut index = SearchIndex::new();
        index.insert("Hex Bolt M6", slot(0));
        index.insert("Hex Nut M6", slot(1));
        index.insert("Washer", slot(2));

        assert_eq!(index.search("hex"), vec![slot(0), slot(1)]);
        assert_eq!(index.search("bolt"), vec![slot(0)]);
        assert_eq!(index.search("M6"), vec![slot(0), slot(1)]);
    }

    #[test]
    fn test_search_any_term_of_node() {
        let mut index = SearchIndex::new();
        index.insert("Resistor", slot(0));
        index.insert("RC0603-10K", slot(0));
        index.insert("R12", slot(0));

        assert_eq!(index.search("0603"), vec![slot(0)]);
        assert_eq!(index.search("r12"), vec![slot(0)]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_no_cross_term_false_positive() {
        let mut index = SearchIndex::new();
        index.insert("ab", slot(0));
        index.insert("bc", slot(0));

        // "abc" shares every 2-gram with the node but no single term holds it
        assert!(index.search("abc").is_empty());
    }

    #[test]
    fn test_short_query_substring() {
        let mut index = SearchIndex::new();
        index.insert("Bracket", slot(0));
        index.insert("Bolt", slot(1));
        index.insert("Shaft", slot(2));
        index.insert("M6", slot(3));

        assert_eq!(index.search("b"), vec![slot(0), slot(1)]);
        assert_eq!(index.search("t"), vec![slot(0), slot(1), slot(2)]);
        assert_eq!(index.search("6"), vec![slot(3)]);
    }

    #[test]
    fn test_empty_inputs() {
        let mut index = SearchIndex::new();
        index.insert("   ", slot(0));
        assert!(index.is_empty());
        assert!(index.search("").is_empty());
        assert!(index.search("zz").is_empty());
    }
}
