//! Core data types for the Recomenda catalog recommender.
//!
//! This module defines the records the engine reads from its collaborators:
//!
//! - Items with free-text fields and a typed attribute mapping
//! - Users with ordered interest tags and purchase history
//! - Ratings and interactions keyed by user and item
//! - A catalog snapshot bundling all of the above for one request
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize` for
//! inspection, copying, and JSON serialization. The engine never mutates
//! them; it only reads snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a catalog item (e.g. `"p1"`, `"tenis-42"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Creates an ItemId from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a UserId from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Item Attributes
// ============================================================================

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A structured attribute on an item: either one scalar or a list of them.
///
/// Keeping this closed makes content-text derivation total; every variant
/// has a textual rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl AttributeValue {
    /// Creates a text scalar attribute.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    /// Creates a list attribute of text values.
    #[must_use]
    pub fn text_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Scalar::Text(v.into())).collect())
    }

    /// Flattens the value into its textual parts, one per scalar.
    pub fn text_parts(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s.to_string()],
            Self::List(values) => values.iter().map(ToString::to_string).collect(),
        }
    }

    /// Returns true if this value (or any list element) equals `needle`,
    /// compared case-insensitively.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.text_parts()
            .iter()
            .any(|part| part.to_lowercase() == needle)
    }
}

// ============================================================================
// Catalog Records
// ============================================================================

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Top-level category (e.g. "tênis", "livros").
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form structured attributes (key order is sorted).
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// When the item was added to the catalog, used for recency fallback.
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Creates a builder for constructing an Item.
    #[must_use]
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> ItemBuilder {
        ItemBuilder::new(id, name)
    }

    /// Derives the lower-cased content text used for vectorization.
    ///
    /// Concatenates name, category, brand, description and every attribute
    /// value (lists flattened), separated by single spaces.
    pub fn content_text(&self) -> String {
        let mut parts: Vec<String> = vec![
            self.name.clone(),
            self.category.clone().unwrap_or_default(),
            self.brand.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
        ];
        for value in self.attributes.values() {
            parts.extend(value.text_parts());
        }
        parts.join(" ").to_lowercase()
    }

    /// Returns the lower-cased category, or an empty string if unset.
    pub fn normalized_category(&self) -> String {
        self.category
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// Returns true if attribute `key` exists and matches `value`.
    pub fn attribute_matches(&self, key: &str, value: &str) -> bool {
        self.attributes
            .get(key)
            .is_some_and(|attr| attr.matches(value))
    }
}

/// Builder for constructing Item instances.
#[derive(Debug)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item: Item {
                id: ItemId::new(id),
                name: name.into(),
                category: None,
                brand: None,
                description: None,
                attributes: BTreeMap::new(),
                added_at: None,
            },
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.item.category = Some(category.into());
        self
    }

    /// Sets the brand.
    #[must_use]
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.item.brand = Some(brand.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.item.description = Some(description.into());
        self
    }

    /// Adds (or replaces) an attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.item.attributes.insert(key.into(), value);
        self
    }

    /// Sets the catalog insertion timestamp.
    #[must_use]
    pub fn added_at(mut self, added_at: DateTime<Utc>) -> Self {
        self.item.added_at = Some(added_at);
        self
    }

    #[must_use]
    pub fn build(self) -> Item {
        self.item
    }
}

/// A user of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    #[serde(default)]
    pub name: Option<String>,

    /// Ordered interest tags as declared by the user.
    #[serde(default)]
    pub interests: Vec<String>,

    /// Optional sub-preference within an interest (e.g. "casual").
    #[serde(default)]
    pub sub_preference: Option<String>,

    /// Items the user has already purchased.
    #[serde(default)]
    pub purchase_history: Vec<ItemId>,
}

impl User {
    /// Creates a user with no interests or history.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: None,
            interests: Vec::new(),
            sub_preference: None,
            purchase_history: Vec::new(),
        }
    }

    /// Sets the interest tags.
    #[must_use]
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sub-preference.
    #[must_use]
    pub fn with_sub_preference(mut self, sub_preference: impl Into<String>) -> Self {
        self.sub_preference = Some(sub_preference.into());
        self
    }

    /// Sets the purchase history.
    #[must_use]
    pub fn with_purchases<I, S>(mut self, purchases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.purchase_history = purchases.into_iter().map(ItemId::new).collect();
        self
    }

    /// Returns interest tags lower-cased and trimmed, dropping empty ones.
    pub fn normalized_interests(&self) -> Vec<String> {
        self.interests
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect()
    }
}

/// A numeric rating of an item by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub score: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Rating {
    /// Creates a rating stamped with the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: UserId::new(user_id),
            item_id: ItemId::new(item_id),
            score,
            timestamp: Utc::now(),
            comment: None,
        }
    }
}

/// Kind of a recorded user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Click,
    Accept,
    View,
    Purchase,
    #[serde(other)]
    Other,
}

/// A user interaction with an item. Consumed only by metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    /// Creates an interaction stamped with the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            user_id: UserId::new(user_id),
            item_id: ItemId::new(item_id),
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// A read-only view of the catalog state for one recommendation request.
///
/// Item order is the catalog order and is used for deterministic
/// tie-breaking throughout the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl CatalogSnapshot {
    /// Looks up a user by id.
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Looks up an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Returns ratings made by `user`, in snapshot order.
    pub fn ratings_by<'a>(&'a self, user: &'a UserId) -> impl Iterator<Item = &'a Rating> + 'a {
        self.ratings.iter().filter(move |r| &r.user_id == user)
    }

    /// Returns item ids ordered from most to least recently added.
    ///
    /// Items without `added_at` come after dated ones; ties keep catalog
    /// order.
    pub fn recent_items(&self) -> Vec<ItemId> {
        let mut indexed: Vec<(usize, &Item)> = self.items.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| match (a.added_at, b.added_at) {
            (Some(ta), Some(tb)) => tb.cmp(&ta).then(ia.cmp(ib)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ia.cmp(ib),
        });
        indexed.into_iter().map(|(_, item)| item.id.clone()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
