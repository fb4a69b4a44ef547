//! Recommender configuration.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::orchestrator::Algorithm;
use crate::tfidf::StopWordLocale;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default number of recommendations per request.
pub const DEFAULT_TOP_N: usize = 5;

/// Tunables for a `RecommendationOrchestrator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Recommendations returned when a request does not say.
    pub top_n: usize,
    /// Entries kept per user in the recommendation history.
    pub history_capacity: usize,
    /// Ratings an item needs before the popularity fallback ranks it.
    pub min_rating_count: usize,
    /// Stop word list used when vectorizing item text.
    pub stopwords: StopWordLocale,
    /// Algorithm used when a request does not say.
    pub algorithm: Algorithm,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_rating_count: 1,
            stopwords: StopWordLocale::default(),
            algorithm: Algorithm::default(),
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `RECOMENDA_TOP_N`: Recommendations per request (default: 5)
    /// - `RECOMENDA_HISTORY_CAPACITY`: History entries per user (default: 5)
    /// - `RECOMENDA_MIN_RATINGS`: Minimum ratings for popularity (default: 1)
    /// - `RECOMENDA_STOPWORDS`: `pt`, `en` or `none` (default: `pt`)
    /// - `RECOMENDA_ALGORITHM`: `content`, `purchase-history`,
    ///   `collaborative` or `auto` (default: `auto`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|_| {})
    }

    /// Like [`from_env`](Self::from_env), but lets the caller override
    /// values before validation.
    pub fn from_env_with<A>(apply: A) -> Result<Self, ConfigError>
    where
        A: FnOnce(&mut Self),
    {
        Self::from_lookup_with(|name| env::var(name).ok(), apply)
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, |_| {})
    }

    /// Reads `lookup`, applies `apply`, then validates the result.
    pub fn from_lookup_with<F, A>(lookup: F, apply: A) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        A: FnOnce(&mut Self),
    {
        let defaults = Self::default();
        let mut config = Self {
            top_n: parse_var(&lookup, "RECOMENDA_TOP_N")?.unwrap_or(defaults.top_n),
            history_capacity: parse_var(&lookup, "RECOMENDA_HISTORY_CAPACITY")?
                .unwrap_or(defaults.history_capacity),
            min_rating_count: parse_var(&lookup, "RECOMENDA_MIN_RATINGS")?
                .unwrap_or(defaults.min_rating_count),
            stopwords: parse_var(&lookup, "RECOMENDA_STOPWORDS")?.unwrap_or(defaults.stopwords),
            algorithm: parse_var(&lookup, "RECOMENDA_ALGORITHM")?.unwrap_or(defaults.algorithm),
        };
        apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                name: "top_n".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "history_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = RecommenderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RecommenderConfig::default());
        assert_eq!(config.top_n, 5);
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.min_rating_count, 1);
        assert_eq!(config.stopwords, StopWordLocale::Portuguese);
        assert_eq!(config.algorithm, Algorithm::Auto);
    }

    #[test]
    fn test_overrides() {
        let config = RecommenderConfig::from_lookup(lookup(&[
            ("RECOMENDA_TOP_N", "10"),
            ("RECOMENDA_HISTORY_CAPACITY", " 3 "),
            ("RECOMENDA_MIN_RATINGS", "2"),
            ("RECOMENDA_STOPWORDS", "en"),
            ("RECOMENDA_ALGORITHM", "collaborative"),
        ]))
        .unwrap();

        assert_eq!(config.top_n, 10);
        assert_eq!(config.history_capacity, 3);
        assert_eq!(config.min_rating_count, 2);
        assert_eq!(config.stopwords, StopWordLocale::English);
        assert_eq!(config.algorithm, Algorithm::Collaborative);
    }

    #[test]
    fn test_unparsable_value() {
        let err = RecommenderConfig::from_lookup(lookup(&[("RECOMENDA_TOP_N", "many")])).unwrap_err();
        let ConfigError::InvalidValue { name, .. } = err;
        assert_eq!(name, "RECOMENDA_TOP_N");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RecommenderConfig::from_lookup(lookup(&[("RECOMENDA_HISTORY_CAPACITY", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("history_capacity"));

        let config = RecommenderConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_applied_before_validation() {
        let config = RecommenderConfig::from_lookup_with(
            lookup(&[("RECOMENDA_TOP_N", "0")]),
            |config: &mut RecommenderConfig| config.top_n = 5,
        )
        .unwrap();
        assert_eq!(config.top_n, 5);

        let err = RecommenderConfig::from_lookup_with(lookup(&[]), |config: &mut RecommenderConfig| {
            config.history_capacity = 0
        })
        .unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
    }

    #[test]
    fn test_partial_json() {
        let config: RecommenderConfig =
            serde_json::from_str(r#"{"top_n": 3, "stopwords": "english"}"#).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.stopwords, StopWordLocale::English);
        assert_eq!(config.history_capacity, 5);
    }

    #[test]
    fn test_from_env() {
        // SAFETY: no other test reads RECOMENDA_MIN_RATINGS from the process environment.
        unsafe { env::set_var("RECOMENDA_MIN_RATINGS", "4") };

        let config = RecommenderConfig::from_env().unwrap();
        assert_eq!(config.min_rating_count, 4);

        // SAFETY: see above.
        unsafe { env::remove_var("RECOMENDA_MIN_RATINGS") };
    }
}
