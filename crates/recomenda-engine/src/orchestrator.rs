//! Request-level recommendation flow.
//!
//! The orchestrator picks an algorithm for a request, builds the content
//! index and rating matrix it needs from the snapshot, applies interest
//! filters and degrades to the popularity fallback when the chosen signal
//! yields nothing.
//!
//! ## Algorithm selection
//!
//! | Algorithm         | Order tried                                          |
//! |-------------------|------------------------------------------------------|
//! | `Content`         | interest profile                                     |
//! | `PurchaseHistory` | purchased-item similarity                            |
//! | `Collaborative`   | similar users' ratings                               |
//! | `Auto`            | ratings (if the user has any), purchases, interests  |
//!
//! Every path ends with popularity, or recency when nothing is rated.
//! Items the user purchased or rated positively are never recommended.

use crate::collaborative::CollaborativeEngine;
use crate::config::RecommenderConfig;
use crate::content::{ContentIndex, ContentSimilarityEngine};
use crate::error::EngineResult;
use crate::history::RecommendationHistory;
use crate::interests::InterestTable;
use crate::matrix::RatingMatrixBuilder;
use crate::popularity::{PopularityBasis, PopularityRanker};
use crate::tfidf::FeatureVectorizer;
use recomenda_core::{CatalogSnapshot, ItemId, User, UserId};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Which signal a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Similarity between item text and the user's interest tags.
    Content,
    /// Similarity between item text and items the user purchased.
    PurchaseHistory,
    /// Ratings of users with similar rating patterns.
    Collaborative,
    /// Best available signal for the user.
    #[default]
    Auto,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Content => "content",
            Self::PurchaseHistory => "purchase-history",
            Self::Collaborative => "collaborative",
            Self::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content" | "content-based" => Ok(Self::Content),
            "purchase-history" | "purchase_history" | "purchases" => Ok(Self::PurchaseHistory),
            "collaborative" => Ok(Self::Collaborative),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown algorithm '{other}' (expected content, purchase-history, collaborative or auto)"
            )),
        }
    }
}

/// Where the items of a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Content,
    PurchaseHistory,
    Collaborative,
    Popularity,
    Recent,
    /// Nothing could be recommended.
    None,
}

impl fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Content => "content",
            Self::PurchaseHistory => "purchase history",
            Self::Collaborative => "collaborative",
            Self::Popularity => "popularity",
            Self::Recent => "recently added",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// A request for recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    /// Falls back to the configured algorithm.
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    /// Falls back to the configured `top_n`.
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl RecommendationRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            algorithm: None,
            top_n: None,
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// Ranked items for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub request_id: Uuid,
    pub user_id: UserId,
    pub items: Vec<ItemId>,
    pub source: RecommendationSource,
}

impl Recommendation {
    fn empty(request_id: Uuid, user_id: UserId) -> Self {
        Self {
            request_id,
            user_id,
            items: Vec::new(),
            source: RecommendationSource::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Computes recommendations from catalog snapshots.
///
/// Holds no catalog state: every call rebuilds vectors and the rating
/// matrix from the snapshot it is given.
#[derive(Debug, Clone)]
pub struct RecommendationOrchestrator {
    config: RecommenderConfig,
    rules: InterestTable,
    content: ContentSimilarityEngine,
    collaborative: CollaborativeEngine,
    popularity: PopularityRanker,
}

impl RecommendationOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if `config` fails validation.
    pub fn new(config: RecommenderConfig, rules: InterestTable) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            popularity: PopularityRanker::new(config.min_rating_count),
            config,
            rules,
            content: ContentSimilarityEngine::default(),
            collaborative: CollaborativeEngine::default(),
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn rules(&self) -> &InterestTable {
        &self.rules
    }

    /// A history sized by the configured capacity.
    pub fn new_history(&self) -> RecommendationHistory {
        RecommendationHistory::new(self.config.history_capacity)
    }

    /// Computes a recommendation and records its items in `history`.
    pub fn recommend(
        &self,
        request: &RecommendationRequest,
        snapshot: &CatalogSnapshot,
        history: &mut RecommendationHistory,
    ) -> Recommendation {
        let recommendation = self.compute(request, snapshot);
        history.record(&recommendation);
        recommendation
    }

    /// Computes a recommendation without touching any history.
    pub fn compute(
        &self,
        request: &RecommendationRequest,
        snapshot: &CatalogSnapshot,
    ) -> Recommendation {
        let request_id = Uuid::new_v4();
        let algorithm = request.algorithm.unwrap_or(self.config.algorithm);
        let top_n = request.top_n.unwrap_or(self.config.top_n);

        let span = info_span!(
            "recommend",
            %request_id,
            user = %request.user_id,
            %algorithm,
            top_n
        );
        let _guard = span.enter();

        let Some(user) = snapshot.user(&request.user_id) else {
            warn!("unknown user; nothing to recommend");
            return Recommendation::empty(request_id, request.user_id.clone());
        };
        if top_n == 0 {
            return Recommendation::empty(request_id, user.id.clone());
        }

        let exclude = exclusions(user, snapshot);
        let index = OnceCell::new();
        let ctx = RequestContext {
            snapshot,
            user,
            exclude: &exclude,
            top_n,
            index: &index,
            stopwords: self.config.stopwords,
        };

        let ranked = match algorithm {
            Algorithm::Content => self.by_interests(&ctx),
            Algorithm::PurchaseHistory => self.by_purchases(&ctx),
            Algorithm::Collaborative => self.by_ratings(&ctx),
            Algorithm::Auto => {
                let has_ratings = snapshot.ratings_by(&user.id).next().is_some();
                has_ratings
                    .then(|| self.by_ratings(&ctx))
                    .flatten()
                    .or_else(|| self.by_purchases(&ctx))
                    .or_else(|| self.by_interests(&ctx))
            }
        };

        let (items, source) = match ranked {
            Some(ranked) => ranked,
            None => {
                warn!("primary signal produced nothing; falling back to popularity");
                self.fallback(&ctx)
            }
        };

        info!(count = items.len(), %source, "recommendation complete");

        Recommendation {
            request_id,
            user_id: user.id.clone(),
            items,
            source,
        }
    }

    fn by_interests(&self, ctx: &RequestContext<'_>) -> Option<(Vec<ItemId>, RecommendationSource)> {
        let interests = ctx.user.normalized_interests();
        if interests.is_empty() {
            debug!("user declares no interests");
            return None;
        }

        let index = ctx.index();
        let query = index.profile_vector(&interests);
        if query.is_zero() {
            debug!("interest profile shares no terms with the catalog");
            return None;
        }

        let candidates = match self.rules.resolve(ctx.user) {
            Some(filter) => {
                debug!(
                    category = %filter.category,
                    subtype = ?filter.subtype,
                    "restricting candidates by interest"
                );
                index.candidates_where(&ctx.snapshot.items, |item| filter.accepts(item))
            }
            None => index.candidates(),
        };
        if candidates.is_empty() {
            debug!("interest filter left no candidates");
            return None;
        }

        let items = self.content.rank(&query, &candidates, ctx.exclude, ctx.top_n);
        non_empty(items, RecommendationSource::Content)
    }

    fn by_purchases(&self, ctx: &RequestContext<'_>) -> Option<(Vec<ItemId>, RecommendationSource)> {
        if ctx.user.purchase_history.is_empty() {
            debug!("user has no purchase history");
            return None;
        }
        let items = self.content.rank_similar_to(
            ctx.index(),
            &ctx.user.purchase_history,
            ctx.exclude,
            ctx.top_n,
        );
        non_empty(items, RecommendationSource::PurchaseHistory)
    }

    fn by_ratings(&self, ctx: &RequestContext<'_>) -> Option<(Vec<ItemId>, RecommendationSource)> {
        let matrix = RatingMatrixBuilder::build(&ctx.snapshot.ratings);
        let items: Vec<ItemId> = self
            .collaborative
            .recommend(&ctx.user.id, matrix.as_ref(), usize::MAX)
            .into_iter()
            .filter(|id| !ctx.exclude.contains(id))
            .take(ctx.top_n)
            .collect();
        non_empty(items, RecommendationSource::Collaborative)
    }

    fn fallback(&self, ctx: &RequestContext<'_>) -> (Vec<ItemId>, RecommendationSource) {
        let recent = ctx.snapshot.recent_items();
        let (items, basis) =
            self.popularity
                .rank(&ctx.snapshot.ratings, &recent, ctx.exclude, ctx.top_n);

        let source = match basis {
            _ if items.is_empty() => RecommendationSource::None,
            PopularityBasis::Ratings => RecommendationSource::Popularity,
            PopularityBasis::Recency => RecommendationSource::Recent,
        };
        (items, source)
    }
}

/// Per-request state shared by the ranking paths.
struct RequestContext<'a> {
    snapshot: &'a CatalogSnapshot,
    user: &'a User,
    exclude: &'a HashSet<ItemId>,
    top_n: usize,
    index: &'a OnceCell<ContentIndex>,
    stopwords: crate::tfidf::StopWordLocale,
}

impl RequestContext<'_> {
    /// The content index, built on first use.
    fn index(&self) -> &ContentIndex {
        self.index.get_or_init(|| {
            ContentIndex::build(
                &self.snapshot.items,
                FeatureVectorizer::with_locale(self.stopwords),
            )
        })
    }
}

/// Items the user purchased or rated positively.
fn exclusions(user: &User, snapshot: &CatalogSnapshot) -> HashSet<ItemId> {
    user.purchase_history
        .iter()
        .cloned()
        .chain(
            snapshot
                .ratings_by(&user.id)
                .filter(|r| r.score > 0.0)
                .map(|r| r.item_id.clone()),
        )
        .collect()
}

fn non_empty(
    items: Vec<ItemId>,
    source: RecommendationSource,
) -> Option<(Vec<ItemId>, RecommendationSource)> {
    (!items.is_empty()).then_some((items, source))
}
