//! Interaction metrics.
//!
//! Read-only summaries over the interaction and rating logs. These never
//! feed back into ranking. Passing `None` as the user aggregates over
//! everyone.

use recomenda_core::{CatalogSnapshot, Interaction, InteractionKind, Rating, UserId};
use serde::{Deserialize, Serialize};

fn for_user<'a>(user: Option<&'a UserId>) -> impl Fn(&UserId) -> bool + 'a {
    move |id: &UserId| user.is_none_or(|u| u == id)
}

/// Number of click interactions.
pub fn click_count(interactions: &[Interaction], user: Option<&UserId>) -> usize {
    let matches = for_user(user);
    interactions
        .iter()
        .filter(|i| matches(&i.user_id) && i.kind == InteractionKind::Click)
        .count()
}

/// Share of interactions that are acceptances, as a percentage.
///
/// Returns 0 when there are no interactions in scope.
pub fn acceptance_rate(interactions: &[Interaction], user: Option<&UserId>) -> f64 {
    let matches = for_user(user);
    let (total, accepted) = interactions
        .iter()
        .filter(|i| matches(&i.user_id))
        .fold((0usize, 0usize), |(total, accepted), i| {
            let hit = usize::from(i.kind == InteractionKind::Accept);
            (total + 1, accepted + hit)
        });

    if total == 0 {
        return 0.0;
    }
    accepted as f64 / total as f64 * 100.0
}

/// Mean rating score, or `None` without ratings in scope.
pub fn mean_rating(ratings: &[Rating], user: Option<&UserId>) -> Option<f64> {
    let matches = for_user(user);
    let (sum, count) = ratings
        .iter()
        .filter(|r| matches(&r.user_id))
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.score, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// All metrics for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub clicks: usize,
    pub interactions: usize,
    pub acceptance_rate: f64,
    pub mean_rating: Option<f64>,
    pub ratings: usize,
}

impl MetricsSummary {
    /// Summarizes `snapshot` for one user, or for everyone.
    pub fn summarize(snapshot: &CatalogSnapshot, user: Option<&UserId>) -> Self {
        let matches = for_user(user);
        Self {
            user_id: user.cloned(),
            clicks: click_count(&snapshot.interactions, user),
            interactions: snapshot
                .interactions
                .iter()
                .filter(|i| matches(&i.user_id))
                .count(),
            acceptance_rate: acceptance_rate(&snapshot.interactions, user),
            mean_rating: mean_rating(&snapshot.ratings, user),
            ratings: snapshot.ratings.iter().filter(|r| matches(&r.user_id)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactions() -> Vec<Interaction> {
        vec![
            Interaction::new("daniel", "p1", InteractionKind::Click),
            Interaction::new("daniel", "p1", InteractionKind::Accept),
            Interaction::new("daniel", "p2", InteractionKind::View),
            Interaction::new("ana", "p2", InteractionKind::Click),
        ]
    }

    #[test]
    fn counts_clicks_per_user_and_overall() {
        let log = interactions();
        assert_eq!(click_count(&log, None), 2);
        assert_eq!(click_count(&log, Some(&UserId::new("daniel"))), 1);
        assert_eq!(click_count(&log, Some(&UserId::new("ghost"))), 0);
    }

    #[test]
    fn acceptance_rate_is_a_percentage() {
        let log = interactions();
        assert!((acceptance_rate(&log, None) - 25.0).abs() < 1e-9);

        let daniel = UserId::new("daniel");
        assert!((acceptance_rate(&log, Some(&daniel)) - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(acceptance_rate(&[], None), 0.0);
    }

    #[test]
    fn mean_rating_none_without_ratings() {
        let ratings = vec![Rating::new("u1", "p1", 5.0), Rating::new("u2", "p1", 2.0)];
        assert_eq!(mean_rating(&ratings, None), Some(3.5));
        assert_eq!(mean_rating(&ratings, Some(&UserId::new("u2"))), Some(2.0));
        assert_eq!(mean_rating(&ratings, Some(&UserId::new("ghost"))), None);
    }

    #[test]
    fn summary_collects_everything() {
        let snapshot = CatalogSnapshot {
            interactions: interactions(),
            ratings: vec![Rating::new("daniel", "p1", 4.0)],
            ..Default::default()
        };
        let daniel = UserId::new("daniel");
        let summary = MetricsSummary::summarize(&snapshot, Some(&daniel));

        assert_eq!(summary.user_id, Some(daniel));
        assert_eq!(summary.clicks, 1);
        assert_eq!(summary.interactions, 3);
        assert_eq!(summary.mean_rating, Some(4.0));
        assert_eq!(summary.ratings, 1);

        let json = serde_json::to_value(MetricsSummary::summarize(&snapshot, None)).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["clicks"], 2);
    }
}
