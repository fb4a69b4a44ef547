//! Popularity fallback ranking.
//!
//! Used when neither content nor collaborative signals produce anything.
//! Items are ranked by mean rating; items with too few ratings are dropped.
//! With no ratings at all the caller-provided recency list is used instead.

use recomenda_core::{ItemId, Rating};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Aggregated rating statistics for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPopularity {
    pub item_id: ItemId,
    pub mean: f64,
    pub count: usize,
}

/// Groups ratings by item, in first-seen order.
pub fn item_stats(ratings: &[Rating]) -> Vec<ItemPopularity> {
    let mut order: Vec<&ItemId> = Vec::new();
    let mut totals: HashMap<&ItemId, (f64, usize)> = HashMap::new();

    for rating in ratings {
        let entry = totals.entry(&rating.item_id).or_insert_with(|| {
            order.push(&rating.item_id);
            (0.0, 0)
        });
        entry.0 += rating.score;
        entry.1 += 1;
    }

    order
        .into_iter()
        .map(|id| {
            let (sum, count) = totals[id];
            ItemPopularity {
                item_id: id.clone(),
                mean: sum / count as f64,
                count,
            }
        })
        .collect()
}

/// Which list a popularity ranking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopularityBasis {
    /// Mean rating over items with enough ratings.
    Ratings,
    /// No ratings existed; most recently added items.
    Recency,
}

/// Ranks items by mean rating, then count, then first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularityRanker {
    /// Minimum number of ratings an item needs to be ranked.
    pub min_count: usize,
}

impl Default for PopularityRanker {
    fn default() -> Self {
        Self { min_count: 1 }
    }
}

impl PopularityRanker {
    pub fn new(min_count: usize) -> Self {
        Self { min_count }
    }

    /// Returns up to `top_n` popular items not in `exclude`.
    ///
    /// When `ratings` is empty the result is drawn from `recent_items`
    /// (most recent first) instead.
    pub fn rank(
        &self,
        ratings: &[Rating],
        recent_items: &[ItemId],
        exclude: &HashSet<ItemId>,
        top_n: usize,
    ) -> (Vec<ItemId>, PopularityBasis) {
        if ratings.is_empty() {
            let items = recent_items
                .iter()
                .filter(|id| !exclude.contains(*id))
                .take(top_n)
                .cloned()
                .collect();
            return (items, PopularityBasis::Recency);
        }

        let mut stats: Vec<ItemPopularity> = item_stats(ratings)
            .into_iter()
            .filter(|s| s.count >= self.min_count && !exclude.contains(&s.item_id))
            .collect();

        // Stable: full ties keep first-seen order
        stats.sort_by(|a, b| {
            b.mean
                .partial_cmp(&a.mean)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.count.cmp(&a.count))
        });

        debug!(
            ranked = stats.len(),
            min_count = self.min_count,
            "ranked items by popularity"
        );

        let items = stats
            .into_iter()
            .take(top_n)
            .map(|s| s.item_id)
            .collect();
        (items, PopularityBasis::Ratings)
    }
}

/// Convenience wrapper over [`PopularityRanker::rank`] with no exclusions.
pub fn popular(
    ratings: &[Rating],
    min_count: usize,
    top_n: usize,
    recent_items: &[ItemId],
) -> Vec<ItemId> {
    PopularityRanker::new(min_count)
        .rank(ratings, recent_items, &HashSet::new(), top_n)
        .0
}
