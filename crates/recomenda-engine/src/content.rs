//! Content-based ranking over TF-IDF item vectors.
//!
//! `ContentIndex` vectorizes a catalog snapshot once per request and keeps
//! item vectors in catalog order. `ContentSimilarityEngine` ranks candidate
//! vectors against a query vector by cosine similarity.
//!
//! ## Ordering
//!
//! Candidates are sorted by similarity descending with a stable sort, so
//! equal scores keep catalog order. Results are reproducible for a given
//! snapshot.

use crate::tfidf::{FeatureVectorizer, TermVector, merge_vectors};
use recomenda_core::{Item, ItemId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tolerance when deciding whether a vector is already unit length.
const UNIT_TOLERANCE: f64 = 1e-9;

/// Cosine similarity between two term vectors.
///
/// For unit vectors this is just the dot product; otherwise the dot product
/// is divided by both norms. Zero vectors have zero similarity to anything.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let mag_a = a.magnitude();
    let mag_b = b.magnitude();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let dot = a.dot(b);
    if (mag_a - 1.0).abs() < UNIT_TOLERANCE && (mag_b - 1.0).abs() < UNIT_TOLERANCE {
        dot
    } else {
        dot / (mag_a * mag_b)
    }
}

/// A candidate item and its vector, borrowed from a `ContentIndex`.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: &'a ItemId,
    pub vector: &'a TermVector,
}

/// Fitted vectorizer plus one vector per catalog item.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    vectorizer: FeatureVectorizer,
    ids: Vec<ItemId>,
    vectors: Vec<TermVector>,
    positions: HashMap<ItemId, usize>,
}

impl ContentIndex {
    /// Vectorizes `items` (in catalog order) with a fresh vectorizer.
    pub fn build(items: &[Item], mut vectorizer: FeatureVectorizer) -> Self {
        let corpus: Vec<String> = items.iter().map(Item::content_text).collect();
        let vectors = vectorizer.fit_transform(&corpus);
        let ids: Vec<ItemId> = items.iter().map(|item| item.id.clone()).collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();

        debug!(
            items = ids.len(),
            vocabulary = vectorizer.corpus().document_frequencies.len(),
            "built content index"
        );

        Self {
            vectorizer,
            ids,
            vectors,
            positions,
        }
    }

    pub fn vectorizer(&self) -> &FeatureVectorizer {
        &self.vectorizer
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the vector for an item, if it is in the catalog.
    pub fn vector(&self, id: &ItemId) -> Option<&TermVector> {
        self.positions.get(id).map(|&pos| &self.vectors[pos])
    }

    /// Every item as a candidate, in catalog order.
    pub fn candidates(&self) -> Vec<Candidate<'_>> {
        self.ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, vector)| Candidate { id, vector })
            .collect()
    }

    /// Items accepted by `predicate` as candidates, in catalog order.
    ///
    /// `items` must be the slice the index was built from.
    pub fn candidates_where<'a, F>(&'a self, items: &'a [Item], predicate: F) -> Vec<Candidate<'a>>
    where
        F: Fn(&Item) -> bool,
    {
        items
            .iter()
            .filter(|item| predicate(item))
            .filter_map(|item| {
                let &pos = self.positions.get(&item.id)?;
                Some(Candidate {
                    id: &self.ids[pos],
                    vector: &self.vectors[pos],
                })
            })
            .collect()
    }

    /// Builds a query vector from interest tags joined into one profile text.
    pub fn profile_vector(&self, interests: &[String]) -> TermVector {
        self.vectorizer.transform(&interests.join(" "))
    }

    /// Builds a normalized query vector from the sum of item vectors.
    ///
    /// Ids not in the catalog are ignored; no known ids gives a zero vector.
    pub fn history_vector(&self, item_ids: &[ItemId]) -> TermVector {
        let vectors: Vec<&TermVector> = item_ids.iter().filter_map(|id| self.vector(id)).collect();
        merge_vectors(&vectors).normalized()
    }

    /// Full pairwise item-item cosine similarity matrix, in catalog order.
    pub fn similarity_matrix(&self) -> Vec<Vec<f64>> {
        self.vectors
            .iter()
            .map(|a| self.vectors.iter().map(|b| cosine(a, b)).collect())
            .collect()
    }
}

/// Ranks candidate vectors against a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSimilarityEngine;

impl ContentSimilarityEngine {
    /// Ranks `candidates` by cosine similarity to `query`.
    ///
    /// Excluded ids never appear. Candidates that share no terms with the
    /// query still rank, after every scoring candidate. Returns an empty
    /// list when the query has no content signal or no candidate remains.
    pub fn rank(
        &self,
        query: &TermVector,
        candidates: &[Candidate<'_>],
        exclude: &HashSet<ItemId>,
        top_n: usize,
    ) -> Vec<ItemId> {
        if query.is_zero() || top_n == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(&ItemId, f64)> = candidates
            .iter()
            .filter(|c| !exclude.contains(c.id))
            .map(|c| (c.id, cosine(query, c.vector)))
            .collect();

        // Stable: equal scores keep candidate (catalog) order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            candidates = candidates.len(),
            scored = scored.len(),
            top_n,
            "ranked content candidates"
        );

        scored
            .into_iter()
            .take(top_n)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Recommends items similar to what the user already purchased.
    ///
    /// The query is the normalized sum of the purchased items' vectors;
    /// purchased items and `exclude` are removed from the result. An empty
    /// purchase history yields an empty list.
    pub fn rank_similar_to(
        &self,
        index: &ContentIndex,
        purchased: &[ItemId],
        exclude: &HashSet<ItemId>,
        top_n: usize,
    ) -> Vec<ItemId> {
        if purchased.is_empty() {
            return Vec::new();
        }

        let query = index.history_vector(purchased);
        let mut excluded = exclude.clone();
        excluded.extend(purchased.iter().cloned());

        self.rank(&query, &index.candidates(), &excluded, top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfidf::StopWordLocale;
    use recomenda_core::AttributeValue;

    fn catalog() -> Vec<Item> {
        vec![
            Item::builder("p1", "")
                .category("electronics")
                .attribute("features", AttributeValue::text_list(["fast"]))
                .build(),
            Item::builder("p2", "")
                .category("electronics")
                .attribute("features", AttributeValue::text_list(["slow"]))
                .build(),
            Item::builder("b1", "")
                .category("books")
                .attribute("genre", AttributeValue::text_list(["fiction"]))
                .build(),
            Item::builder("b2", "")
                .category("books")
                .attribute("genre", AttributeValue::text_list(["non-fiction"]))
                .build(),
        ]
    }

    fn index() -> ContentIndex {
        ContentIndex::build(
            &catalog(),
            FeatureVectorizer::with_locale(StopWordLocale::Portuguese),
        )
    }

    fn ids(list: &[&str]) -> Vec<ItemId> {
        list.iter().map(|s| ItemId::new(*s)).collect()
    }

    #[test]
    fn similarity_matrix_has_unit_diagonal() {
        let matrix = index().similarity_matrix();
        assert_eq!(matrix.len(), 4);
        for (i, row) in matrix.iter().enumerate() {
            assert_eq!(row.len(), 4);
            assert!((row[i] - 1.0).abs() < 1e-9);
        }
        assert!(matrix[0][2].abs() < 1e-9);
        assert!((matrix[0][1] - matrix[1][0]).abs() < 1e-12);
    }

    #[test]
    fn purchase_history_recommends_same_category() {
        let index = index();
        let engine = ContentSimilarityEngine::default();

        let recs = engine.rank_similar_to(&index, &ids(&["p1"]), &HashSet::new(), 5);
        assert_eq!(recs, ids(&["p2", "b1", "b2"]));

        let recs = engine.rank_similar_to(&index, &ids(&["b2"]), &HashSet::new(), 1);
        assert_eq!(recs, ids(&["b1"]));
    }

    #[test]
    fn empty_purchase_history_yields_nothing() {
        let index = index();
        let engine = ContentSimilarityEngine::default();
        assert!(engine.rank_similar_to(&index, &[], &HashSet::new(), 5).is_empty());
    }

    #[test]
    fn unknown_purchases_yield_nothing() {
        let index = index();
        let engine = ContentSimilarityEngine::default();
        let recs = engine.rank_similar_to(&index, &ids(&["ghost"]), &HashSet::new(), 5);
        assert!(recs.is_empty());
    }

    #[test]
    fn rank_respects_exclusions_and_top_n() {
        let index = index();
        let engine = ContentSimilarityEngine::default();
        let query = index.profile_vector(&["electronics".to_string()]);

        let all = engine.rank(&query, &index.candidates(), &HashSet::new(), 10);
        assert_eq!(all, ids(&["p1", "p2", "b1", "b2"]));

        let exclude: HashSet<ItemId> = ids(&["p1"]).into_iter().collect();
        let rest = engine.rank(&query, &index.candidates(), &exclude, 10);
        assert_eq!(rest, ids(&["p2", "b1", "b2"]));

        let one = engine.rank(&query, &index.candidates(), &HashSet::new(), 1);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn unrelated_candidates_fill_top_n() {
        let index = index();
        let query = index.profile_vector(&["electronics".to_string()]);

        let recs = ContentSimilarityEngine.rank(&query, &index.candidates(), &HashSet::new(), 4);
        assert_eq!(recs.len(), 4);
        assert_eq!(&recs[2..], ids(&["b1", "b2"]).as_slice());
    }

    #[test]
    fn ties_keep_catalog_order() {
        let items = vec![
            Item::builder("z", "shoe").build(),
            Item::builder("a", "shoe").build(),
            Item::builder("m", "shoe").build(),
        ];
        let index = ContentIndex::build(&items, FeatureVectorizer::with_locale(StopWordLocale::None));
        let query = index.profile_vector(&["shoe".to_string()]);

        let recs = ContentSimilarityEngine::default().rank(&query, &index.candidates(), &HashSet::new(), 3);
        assert_eq!(recs, ids(&["z", "a", "m"]));
    }

    #[test]
    fn zero_query_yields_nothing() {
        let index = index();
        let query = index.profile_vector(&["unrelated".to_string()]);
        assert!(query.is_zero());
        let recs = ContentSimilarityEngine::default().rank(&query, &index.candidates(), &HashSet::new(), 5);
        assert!(recs.is_empty());
    }

    #[test]
    fn candidates_where_filters_in_catalog_order() {
        let items = catalog();
        let index = ContentIndex::build(&items, FeatureVectorizer::default());
        let books = index.candidates_where(&items, |item| item.normalized_category() == "books");
        let got: Vec<&str> = books.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(got, vec!["b1", "b2"]);
    }

    #[test]
    fn cosine_falls_back_to_norms_for_unnormalized_vectors() {
        let mut a = TermVector::default();
        a.weights.insert("x".into(), 3.0);
        let mut b = TermVector::default();
        b.weights.insert("x".into(), 2.0);
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-9);
        assert_eq!(cosine(&a, &TermVector::default()), 0.0);
    }
}
