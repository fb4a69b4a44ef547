//! User-user collaborative filtering.
//!
//! ## Algorithm
//!
//! 1. Compute cosine similarity between every pair of matrix rows
//! 2. Order the target's neighbours by similarity, highest first
//! 3. For each neighbour, for each item it rated positively that the
//!    target has not rated, add `similarity * neighbour_rating` to the
//!    item's score
//! 4. Rank items by score; equal scores keep first-encountered order
//!
//! An all-zero row has zero similarity to every row, itself included.
//! Items the target rated are never scored, whatever its neighbours think.

use crate::error::{EngineError, EngineResult};
use crate::matrix::UserItemMatrix;
use recomenda_core::{ItemId, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Cosine similarity between two dense rows. Zero rows score 0.
pub fn row_cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Symmetric user-user similarity table, indexed like the matrix rows.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSimilarity {
    values: Vec<Vec<f64>>,
}

impl UserSimilarity {
    /// Computes pairwise row similarities for `matrix`.
    pub fn compute(matrix: &UserItemMatrix) -> Self {
        let rows = matrix.rows();
        let n = rows.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i..n {
                let sim = row_cosine(&rows[i], &rows[j]);
                values[i][j] = sim;
                values[j][i] = sim;
            }
        }

        Self { values }
    }

    /// Wraps a precomputed table.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the table is not square.
    pub fn from_values(values: Vec<Vec<f64>>) -> EngineResult<Self> {
        let n = values.len();
        if let Some(row) = values.iter().find(|row| row.len() != n) {
            return Err(EngineError::DimensionMismatch {
                what: "similarity columns",
                expected: n,
                actual: row.len(),
            });
        }
        Ok(Self { values })
    }

    /// Number of users covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Similarity between rows `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// The similarity row for user position `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i]
    }
}

/// Recommends unseen items from similar users' ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollaborativeEngine {
    /// Only the `k` most similar neighbours contribute. `None` uses all.
    pub neighbors: Option<usize>,
}

impl CollaborativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts aggregation to the `k` nearest neighbours.
    pub fn with_neighbors(k: usize) -> Self {
        Self { neighbors: Some(k) }
    }

    /// Computes similarities and recommends in one step.
    ///
    /// Returns an empty list when `matrix` is absent or the target is not a
    /// row of it.
    pub fn recommend(
        &self,
        target: &UserId,
        matrix: Option<&UserItemMatrix>,
        top_n: usize,
    ) -> Vec<ItemId> {
        let Some(matrix) = matrix else {
            return Vec::new();
        };
        let similarity = UserSimilarity::compute(matrix);
        // A freshly computed table always matches its matrix
        self.recommend_with(target, matrix, &similarity, top_n)
            .unwrap_or_default()
    }

    /// Recommends using a precomputed similarity table.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `similarity` does not cover exactly
    /// the matrix rows.
    pub fn recommend_with(
        &self,
        target: &UserId,
        matrix: &UserItemMatrix,
        similarity: &UserSimilarity,
        top_n: usize,
    ) -> EngineResult<Vec<ItemId>> {
        Ok(self
            .score(target, matrix, similarity)?
            .into_iter()
            .take(top_n)
            .map(|(id, _)| id)
            .collect())
    }

    /// Returns every candidate item with its aggregated score, best first.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `similarity` does not cover exactly
    /// the matrix rows.
    pub fn score(
        &self,
        target: &UserId,
        matrix: &UserItemMatrix,
        similarity: &UserSimilarity,
    ) -> EngineResult<Vec<(ItemId, f64)>> {
        let (rows, _) = matrix.shape();
        if similarity.len() != rows {
            return Err(EngineError::DimensionMismatch {
                what: "user similarity",
                expected: rows,
                actual: similarity.len(),
            });
        }

        let Some(target_pos) = matrix.user_position(target) else {
            debug!(user = %target, "user has no ratings; no collaborative signal");
            return Ok(Vec::new());
        };

        let sims = similarity.row(target_pos);
        let mut neighbors: Vec<usize> = (0..rows).filter(|&u| u != target_pos).collect();
        // Stable: equally similar neighbours keep row order
        neighbors.sort_by(|&a, &b| {
            sims[b]
                .partial_cmp(&sims[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(k) = self.neighbors {
            neighbors.truncate(k);
        }

        let target_row = matrix.row_at(target_pos);
        let mut order: Vec<usize> = Vec::new();
        let mut scores: HashMap<usize, f64> = HashMap::new();

        for &neighbor in &neighbors {
            let weight = sims[neighbor];
            for (col, &rating) in matrix.row_at(neighbor).iter().enumerate() {
                if rating <= 0.0 || target_row[col] > 0.0 {
                    continue;
                }
                let score = scores.entry(col).or_insert_with(|| {
                    order.push(col);
                    0.0
                });
                *score += weight * rating;
            }
        }

        let mut ranked: Vec<(usize, f64)> = order.into_iter().map(|col| (col, scores[&col])).collect();
        // Stable: equal scores keep first-encountered order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            user = %target,
            neighbors = neighbors.len(),
            candidates = ranked.len(),
            "scored collaborative candidates"
        );

        let item_ids = matrix.item_ids();
        Ok(ranked
            .into_iter()
            .map(|(col, score)| (item_ids[col].clone(), score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RatingMatrixBuilder;
    use recomenda_core::Rating;

    fn sample_matrix() -> UserItemMatrix {
        RatingMatrixBuilder::build(&[
            Rating::new("u1", "p1", 5.0),
            Rating::new("u1", "p2", 4.0),
            Rating::new("u2", "p1", 3.0),
            Rating::new("u2", "p3", 5.0),
        ])
        .unwrap()
    }

    fn ids(list: &[&str]) -> Vec<ItemId> {
        list.iter().map(|s| ItemId::new(*s)).collect()
    }

    #[test]
    fn similarity_is_symmetric_with_unit_diagonal() {
        let matrix = RatingMatrixBuilder::build(&[
            Rating::new("a", "x", 1.0),
            Rating::new("a", "y", 2.0),
            Rating::new("b", "y", 5.0),
            Rating::new("c", "x", 3.0),
            Rating::new("c", "z", 1.0),
        ])
        .unwrap();
        let sim = UserSimilarity::compute(&matrix);

        for i in 0..sim.len() {
            assert!((sim.get(i, i) - 1.0).abs() < 1e-9);
            for j in 0..sim.len() {
                assert_eq!(sim.get(i, j), sim.get(j, i));
            }
        }
    }

    #[test]
    fn zero_row_has_zero_similarity() {
        let matrix = UserItemMatrix::from_parts(
            vec![UserId::new("a"), UserId::new("b")],
            vec![ItemId::new("x")],
            vec![vec![0.0], vec![4.0]],
        )
        .unwrap();
        let sim = UserSimilarity::compute(&matrix);
        assert_eq!(sim.get(0, 0), 0.0);
        assert_eq!(sim.get(0, 1), 0.0);
        assert!((sim.get(1, 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recommends_unseen_items_from_neighbors() {
        let matrix = sample_matrix();
        let engine = CollaborativeEngine::new();

        let u1 = engine.recommend(&UserId::new("u1"), Some(&matrix), 5);
        assert_eq!(u1, ids(&["p3"]));

        let u2 = engine.recommend(&UserId::new("u2"), Some(&matrix), 5);
        assert_eq!(u2, ids(&["p2"]));
    }

    #[test]
    fn unknown_user_or_missing_matrix_yields_nothing() {
        let matrix = sample_matrix();
        let engine = CollaborativeEngine::new();
        assert!(engine.recommend(&UserId::new("ghost"), Some(&matrix), 5).is_empty());
        assert!(engine.recommend(&UserId::new("u1"), None, 5).is_empty());
    }

    #[test]
    fn scores_weight_neighbors_by_similarity() {
        // t likes x; n1 agrees strongly and likes a; n2 barely overlaps and likes b
        let matrix = RatingMatrixBuilder::build(&[
            Rating::new("t", "x", 5.0),
            Rating::new("t", "y", 1.0),
            Rating::new("n1", "x", 5.0),
            Rating::new("n1", "a", 2.0),
            Rating::new("n2", "y", 5.0),
            Rating::new("n2", "b", 5.0),
        ])
        .unwrap();
        let sim = UserSimilarity::compute(&matrix);
        let scored = CollaborativeEngine::new()
            .score(&UserId::new("t"), &matrix, &sim)
            .unwrap();

        let t = matrix.user_position(&UserId::new("t")).unwrap();
        let n1 = matrix.user_position(&UserId::new("n1")).unwrap();
        let n2 = matrix.user_position(&UserId::new("n2")).unwrap();
        let expected_a = sim.get(t, n1) * 2.0;
        let expected_b = sim.get(t, n2) * 5.0;

        let score_of = |id: &str| scored.iter().find(|(i, _)| i.as_str() == id).unwrap().1;
        assert!((score_of("a") - expected_a).abs() < 1e-9);
        assert!((score_of("b") - expected_b).abs() < 1e-9);
        assert!(scored.iter().all(|(id, _)| id.as_str() != "x" && id.as_str() != "y"));
    }

    #[test]
    fn equal_scores_keep_first_encountered_order() {
        let matrix = RatingMatrixBuilder::build(&[
            Rating::new("t", "x", 1.0),
            Rating::new("n", "x", 1.0),
            Rating::new("n", "q", 2.0),
            Rating::new("n", "b", 2.0),
            Rating::new("n", "a", 2.0),
        ])
        .unwrap();
        let recs = CollaborativeEngine::new().recommend(&UserId::new("t"), Some(&matrix), 10);
        assert_eq!(recs, ids(&["q", "b", "a"]));
    }

    #[test]
    fn neighbor_limit_drops_distant_users() {
        let matrix = RatingMatrixBuilder::build(&[
            Rating::new("t", "x", 5.0),
            Rating::new("near", "x", 5.0),
            Rating::new("near", "a", 3.0),
            Rating::new("far", "b", 3.0),
        ])
        .unwrap();
        let all = CollaborativeEngine::new().recommend(&UserId::new("t"), Some(&matrix), 10);
        assert_eq!(all, ids(&["a", "b"]));

        let nearest = CollaborativeEngine::with_neighbors(1).recommend(&UserId::new("t"), Some(&matrix), 10);
        assert_eq!(nearest, ids(&["a"]));
    }

    #[test]
    fn mismatched_similarity_is_a_hard_error() {
        let matrix = sample_matrix();
        let sim = UserSimilarity::from_values(vec![vec![1.0]]).unwrap();
        let err = CollaborativeEngine::new()
            .recommend_with(&UserId::new("u1"), &matrix, &sim, 5)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn non_square_similarity_is_rejected() {
        assert!(UserSimilarity::from_values(vec![vec![1.0, 0.0]]).is_err());
    }
}
