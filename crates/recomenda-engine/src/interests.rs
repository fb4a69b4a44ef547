//! Interest-driven candidate filtering.
//!
//! Some interest tags narrow the candidate set before content ranking: a
//! user interested in "tênis" should only see items from that category, and
//! a sub-type tag such as "casual" narrows further by an item attribute.
//! The mapping is a small declarative table so new categories are data,
//! not code.

use recomenda_core::{Item, User};
use serde::{Deserialize, Serialize};

/// One row of the interest table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRule {
    /// Interest tag that activates this rule (lower-case).
    pub tag: String,

    /// Category items must belong to (compared lower-cased).
    pub category: String,

    /// Item attribute holding the sub-type, if the rule supports one.
    #[serde(default)]
    pub subtype_attribute: Option<String>,

    /// Interest tags recognised as sub-types (lower-case).
    #[serde(default)]
    pub subtypes: Vec<String>,
}

impl InterestRule {
    /// Creates a rule that only restricts by category.
    pub fn category(tag: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            category: category.into(),
            subtype_attribute: None,
            subtypes: Vec::new(),
        }
    }

    /// Adds a sub-type attribute and its recognised values.
    #[must_use]
    pub fn with_subtypes<I, S>(mut self, attribute: impl Into<String>, subtypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtype_attribute = Some(attribute.into());
        self.subtypes = subtypes.into_iter().map(Into::into).collect();
        self
    }
}

/// A resolved filter for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    pub category: String,
    /// `(attribute, value)` the item must carry.
    pub subtype: Option<(String, String)>,
}

impl CandidateFilter {
    /// Returns true if `item` passes this filter.
    pub fn accepts(&self, item: &Item) -> bool {
        if item.normalized_category() != self.category {
            return false;
        }
        match &self.subtype {
            Some((attribute, value)) => item.attribute_matches(attribute, value),
            None => true,
        }
    }
}

/// Ordered table of interest rules. The first rule whose tag the user
/// declares wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<InterestRule>", into = "Vec<InterestRule>")]
pub struct InterestTable {
    rules: Vec<InterestRule>,
}

impl From<Vec<InterestRule>> for InterestTable {
    fn from(rules: Vec<InterestRule>) -> Self {
        Self::new(rules)
    }
}

impl From<InterestTable> for Vec<InterestRule> {
    fn from(table: InterestTable) -> Self {
        table.rules
    }
}

impl Default for InterestTable {
    fn default() -> Self {
        Self::new(vec![
            InterestRule::category("tênis", "tênis")
                .with_subtypes("tipo_tenis", ["casual", "esportivo"]),
            InterestRule::category("livros", "livros")
                .with_subtypes("genero", ["ficção", "não-ficção", "romance", "fantasia"]),
        ])
    }
}

impl InterestTable {
    /// Creates a table from rules; tags and values are lower-cased.
    pub fn new(rules: Vec<InterestRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.tag = rule.tag.to_lowercase();
                rule.category = rule.category.to_lowercase();
                rule.subtypes = rule.subtypes.iter().map(|s| s.to_lowercase()).collect();
                rule
            })
            .collect();
        Self { rules }
    }

    /// A table with no rules; never filters.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[InterestRule] {
        &self.rules
    }

    /// Resolves the filter that applies to `user`, if any.
    ///
    /// The sub-type comes from the user's explicit sub-preference when set,
    /// otherwise from the first declared interest that the rule lists as a
    /// sub-type.
    pub fn resolve(&self, user: &User) -> Option<CandidateFilter> {
        let interests = user.normalized_interests();
        let rule = self
            .rules
            .iter()
            .find(|rule| interests.iter().any(|i| *i == rule.tag))?;

        let subtype = rule.subtype_attribute.as_ref().and_then(|attribute| {
            let value = user
                .sub_preference
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    interests
                        .iter()
                        .find(|i| rule.subtypes.contains(i))
                        .cloned()
                })?;
            Some((attribute.clone(), value))
        });

        Some(CandidateFilter {
            category: rule.category.clone(),
            subtype,
        })
    }
}
