//! recomenda-engine: content-based and collaborative recommendation
//!
//! This crate provides:
//! - TF-IDF item vectorization with locale stop word lists
//! - Cosine ranking of items against interest profiles and purchase histories
//! - Declarative interest rules that narrow candidates by category and sub-type
//! - User-item rating matrices and user-user collaborative filtering
//! - Popularity and recency fallbacks
//! - A bounded per-user recommendation history
//! - Interaction metrics
//!
//! ## Modules
//!
//! - [`tfidf`]: Tokenization, corpus statistics and `FeatureVectorizer`
//! - [`content`]: `ContentIndex` and `ContentSimilarityEngine`
//! - [`interests`]: Interest tag to candidate filter table
//! - [`matrix`]: `RatingMatrixBuilder` and `UserItemMatrix`
//! - [`collaborative`]: User similarity and `CollaborativeEngine`
//! - [`popularity`]: Mean-rating ranking with recency fallback
//! - [`history`]: `BoundedHistoryStore` and `RecommendationHistory`
//! - [`orchestrator`]: Algorithm selection and fallbacks per request
//! - [`metrics`]: Click, acceptance and rating summaries
//! - [`config`]: `RecommenderConfig` from defaults, env or serde
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use recomenda_engine::{
//!     InterestTable, RecommendationOrchestrator, RecommendationRequest, RecommenderConfig,
//! };
//!
//! let orchestrator =
//!     RecommendationOrchestrator::new(RecommenderConfig::default(), InterestTable::default())?;
//! let mut history = orchestrator.new_history();
//!
//! let rec = orchestrator.recommend(&RecommendationRequest::new("daniel"), &snapshot, &mut history);
//! println!("{} via {}", rec.items.len(), rec.source);
//! println!("{}", history.render(&rec.user_id));
//! ```

pub use recomenda_core;

pub mod collaborative;
pub mod config;
pub mod content;
pub mod error;
pub mod history;
pub mod interests;
pub mod matrix;
pub mod metrics;
pub mod orchestrator;
pub mod popularity;
pub mod tfidf;

// Re-export main types for convenience
pub use collaborative::{CollaborativeEngine, UserSimilarity};
pub use config::{ConfigError, DEFAULT_TOP_N, RecommenderConfig};
pub use content::{Candidate, ContentIndex, ContentSimilarityEngine, cosine};
pub use error::{EngineError, EngineResult};
pub use history::{BoundedHistoryStore, DEFAULT_HISTORY_CAPACITY, RecommendationHistory};
pub use interests::{CandidateFilter, InterestRule, InterestTable};
pub use matrix::{RatingMatrixBuilder, UserItemMatrix};
pub use metrics::MetricsSummary;
pub use orchestrator::{
    Algorithm, Recommendation, RecommendationOrchestrator, RecommendationRequest,
    RecommendationSource,
};
pub use popularity::{ItemPopularity, PopularityBasis, PopularityRanker, popular};
pub use tfidf::{FeatureVectorizer, StopWordLocale, TermVector};
