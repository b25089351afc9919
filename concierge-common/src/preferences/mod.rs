//! Cultural preference sets
//!
//! A [`PreferenceSet`] maps a category ("music", "film", "cuisine", "fashion",
//! "travel", or anything else the extraction model returns) to an ordered
//! list of free-text labels. Labels within a category are kept unique under
//! [`normalize`]; the first-seen surface form is the one displayed.

mod merge;
mod normalize;

pub use merge::{dedupe, merge};
pub use normalize::normalize;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories the onboarding conversation asks about
pub const DEFAULT_CATEGORIES: [&str; 5] = ["music", "film", "cuisine", "fashion", "travel"];

/// Category name to ordered labels
///
/// Backed by a `BTreeMap` so iteration (and therefore serialization and
/// merge output) is always in sorted category order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSet(BTreeMap<String, Vec<String>>);

impl PreferenceSet {
    /// Create an empty preference set
    pub fn new() -> Self {
        Self::default()
    }

    /// Preference set with every default category present and empty
    pub fn with_default_categories() -> Self {
        DEFAULT_CATEGORIES
            .iter()
            .map(|category| (category.to_string(), Vec::<String>::new()))
            .collect()
    }

    /// Labels stored for a category (empty slice when absent)
    pub fn labels(&self, category: &str) -> &[String] {
        self.0.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the category key is present (possibly with no labels)
    pub fn contains_category(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    /// Replace the labels of one category
    pub fn insert(&mut self, category: impl Into<String>, labels: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(category.into(), labels)
    }

    /// Category names in sorted order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate `(category, labels)` in sorted category order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of categories present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no category is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of labels across all categories
    pub fn label_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl From<BTreeMap<String, Vec<String>>> for PreferenceSet {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl<K, L> FromIterator<(K, Vec<L>)> for PreferenceSet
where
    K: Into<String>,
    L: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Vec<L>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, labels)| (k.into(), labels.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}
