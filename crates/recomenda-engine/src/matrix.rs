//! Dense user-item rating matrix.
//!
//! Ratings are pivoted into rows (users) and columns (items). Rows and
//! columns appear in first-seen order of the rating log; cells without a
//! rating are 0. When the same (user, item) pair is rated more than once,
//! the last rating in the log wins.
//!
//! The matrix is rebuilt wholesale from a rating snapshot; there is no
//! incremental update.

use crate::error::{EngineError, EngineResult};
use recomenda_core::{ItemId, Rating, UserId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A dense users x items matrix of rating scores.
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    cells: Vec<Vec<f64>>,
}

impl UserItemMatrix {
    /// Assembles a matrix from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a user or item id repeats and
    /// `DimensionMismatch` if `cells` is not `users x items`.
    pub fn from_parts(
        user_ids: Vec<UserId>,
        item_ids: Vec<ItemId>,
        cells: Vec<Vec<f64>>,
    ) -> EngineResult<Self> {
        if cells.len() != user_ids.len() {
            return Err(EngineError::DimensionMismatch {
                what: "matrix rows",
                expected: user_ids.len(),
                actual: cells.len(),
            });
        }
        if let Some(row) = cells.iter().find(|row| row.len() != item_ids.len()) {
            return Err(EngineError::DimensionMismatch {
                what: "matrix columns",
                expected: item_ids.len(),
                actual: row.len(),
            });
        }

        let user_index = index_unique(&user_ids, "matrix rows", UserId::to_string)?;
        let item_index = index_unique(&item_ids, "matrix columns", ItemId::to_string)?;

        Ok(Self {
            user_ids,
            item_ids,
            user_index,
            item_index,
            cells,
        })
    }

    /// Row ids in row order.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Column ids in column order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Returns `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.user_ids.len(), self.item_ids.len())
    }

    /// Row position of a user.
    pub fn user_position(&self, user: &UserId) -> Option<usize> {
        self.user_index.get(user).copied()
    }

    /// Column position of an item.
    pub fn item_position(&self, item: &ItemId) -> Option<usize> {
        self.item_index.get(item).copied()
    }

    /// The rating of `item` by `user`, or 0 when either is unknown.
    pub fn get(&self, user: &UserId, item: &ItemId) -> f64 {
        match (self.user_position(user), self.item_position(item)) {
            (Some(row), Some(col)) => self.cells[row][col],
            _ => 0.0,
        }
    }

    /// The full row for a user.
    pub fn row(&self, user: &UserId) -> Option<&[f64]> {
        self.user_position(user).map(|row| self.cells[row].as_slice())
    }

    /// The row at a position. Panics if out of range.
    pub fn row_at(&self, position: usize) -> &[f64] {
        &self.cells[position]
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.cells
    }

    /// Items the user rated positively, in column order.
    pub fn rated_items(&self, user: &UserId) -> Vec<&ItemId> {
        self.row(user)
            .map(|row| {
                row.iter()
                    .zip(&self.item_ids)
                    .filter(|(score, _)| **score > 0.0)
                    .map(|(_, id)| id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn index_unique<T, F>(ids: &[T], what: &'static str, render: F) -> EngineResult<HashMap<T, usize>>
where
    T: Clone + Eq + std::hash::Hash,
    F: Fn(&T) -> String,
{
    let mut index = HashMap::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), pos).is_some() {
            return Err(EngineError::DuplicateId {
                what,
                id: render(id),
            });
        }
    }
    Ok(index)
}

/// Pivots a rating log into a `UserItemMatrix`.
pub struct RatingMatrixBuilder;

impl RatingMatrixBuilder {
    /// Builds the matrix, or `None` when there are no ratings.
    pub fn build(ratings: &[Rating]) -> Option<UserItemMatrix> {
        if ratings.is_empty() {
            return None;
        }

        let mut user_ids: Vec<UserId> = Vec::new();
        let mut item_ids: Vec<ItemId> = Vec::new();
        let mut seen_users: HashSet<&UserId> = HashSet::new();
        let mut seen_items: HashSet<&ItemId> = HashSet::new();

        for rating in ratings {
            if seen_users.insert(&rating.user_id) {
                user_ids.push(rating.user_id.clone());
            }
            if seen_items.insert(&rating.item_id) {
                item_ids.push(rating.item_id.clone());
            }
        }

        let user_index: HashMap<&UserId, usize> =
            user_ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        let item_index: HashMap<&ItemId, usize> =
            item_ids.iter().enumerate().map(|(i, id)| (id, i)).collect();

        let mut cells = vec![vec![0.0; item_ids.len()]; user_ids.len()];
        for rating in ratings {
            let row = user_index[&rating.user_id];
            let col = item_index[&rating.item_id];
            cells[row][col] = rating.score;
        }

        debug!(
            users = user_ids.len(),
            items = item_ids.len(),
            ratings = ratings.len(),
            "built user-item matrix"
        );

        let user_index: HashMap<UserId, usize> =
            user_index.into_iter().map(|(id, i)| (id.clone(), i)).collect();
        let item_index: HashMap<ItemId, usize> =
            item_index.into_iter().map(|(id, i)| (id.clone(), i)).collect();

        Some(UserItemMatrix {
            user_ids,
            item_ids,
            user_index,
            item_index,
            cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ratings() -> Vec<Rating> {
        vec![
            Rating::new("u1", "p1", 5.0),
            Rating::new("u1", "p2", 4.0),
            Rating::new("u2", "p1", 3.0),
            Rating::new("u2", "p3", 5.0),
        ]
    }

    #[test]
    fn build_pivots_ratings() {
        let matrix = RatingMatrixBuilder::build(&sample_ratings()).unwrap();

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.user_ids(), &[UserId::new("u1"), UserId::new("u2")]);
        assert_eq!(
            matrix.item_ids(),
            &[ItemId::new("p1"), ItemId::new("p2"), ItemId::new("p3")]
        );
        assert_eq!(matrix.get(&UserId::new("u1"), &ItemId::new("p1")), 5.0);
        assert_eq!(matrix.get(&UserId::new("u2"), &ItemId::new("p2")), 0.0);
        assert_eq!(matrix.row(&UserId::new("u2")).unwrap(), &[3.0, 0.0, 5.0]);
    }

    #[test]
    fn build_uses_first_seen_order() {
        let ratings = vec![
            Rating::new("zed", "p9", 1.0),
            Rating::new("amy", "p1", 2.0),
            Rating::new("zed", "p1", 3.0),
        ];
        let matrix = RatingMatrixBuilder::build(&ratings).unwrap();
        assert_eq!(matrix.user_ids(), &[UserId::new("zed"), UserId::new("amy")]);
        assert_eq!(matrix.item_ids(), &[ItemId::new("p9"), ItemId::new("p1")]);
    }

    #[test]
    fn build_last_rating_wins() {
        let ratings = vec![Rating::new("u1", "p1", 2.0), Rating::new("u1", "p1", 4.0)];
        let matrix = RatingMatrixBuilder::build(&ratings).unwrap();
        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.get(&UserId::new("u1"), &ItemId::new("p1")), 4.0);
    }

    #[test]
    fn build_empty_is_none() {
        assert!(RatingMatrixBuilder::build(&[]).is_none());
    }

    #[test]
    fn unknown_ids_read_as_zero() {
        let matrix = RatingMatrixBuilder::build(&sample_ratings()).unwrap();
        assert_eq!(matrix.get(&UserId::new("ghost"), &ItemId::new("p1")), 0.0);
        assert!(matrix.row(&UserId::new("ghost")).is_none());
        assert!(matrix.rated_items(&UserId::new("ghost")).is_empty());
    }

    #[test]
    fn rated_items_skips_non_positive() {
        let ratings = vec![Rating::new("u1", "p1", 0.0), Rating::new("u1", "p2", 3.0)];
        let matrix = RatingMatrixBuilder::build(&ratings).unwrap();
        assert_eq!(matrix.rated_items(&UserId::new("u1")), vec![&ItemId::new("p2")]);
    }

    #[test]
    fn from_parts_rejects_bad_dimensions() {
        let err = UserItemMatrix::from_parts(
            vec![UserId::new("u1"), UserId::new("u2")],
            vec![ItemId::new("p1")],
            vec![vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch { expected: 2, actual: 1, .. }
        ));

        let err = UserItemMatrix::from_parts(
            vec![UserId::new("u1")],
            vec![ItemId::new("p1"), ItemId::new("p2")],
            vec![vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { what: "matrix columns", .. }));
    }

    #[test]
    fn from_parts_rejects_duplicate_ids() {
        let err = UserItemMatrix::from_parts(
            vec![UserId::new("u1"), UserId::new("u1")],
            vec![ItemId::new("p1")],
            vec![vec![1.0], vec![2.0]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateId {
                what: "matrix rows",
                id: "u1".to_string()
            }
        );
    }
}
