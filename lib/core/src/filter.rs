// Hard exclusion filters applied after similarity scoring
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use crate::ItemRecord;

pub trait Filter: Sync {
    fn matches(&self, item: &ItemRecord) -> bool;
}

/// Negative constraints a user has stated for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusions {
    #[serde(default)]
    pub fit: Vec<String>,
    #[serde(default)]
    pub pattern: Vec<String>,
    /// Maximum acceptable price; items priced above it, or with no known
    /// price, are dropped.
    #[serde(default)]
    pub price_threshold: Option<u64>,
}

impl Exclusions {
    /// Trims values and drops empty ones. Vocabulary is not checked: an unknown
    /// value simply never matches an item.
    pub fn new<F, P>(fit: F, pattern: P, price_threshold: Option<u64>) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            fit: clean_values(fit),
            pattern: clean_values(pattern),
            price_threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fit.is_empty() && self.pattern.is_empty() && self.price_threshold.is_none()
    }

    pub fn to_filter(&self) -> ExclusionFilter {
        ExclusionFilter {
            fits: self.fit.iter().cloned().collect(),
            patterns: self.pattern.iter().cloned().collect(),
            max_price: self.price_threshold,
        }
    }
}

fn clean_values<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = AHashSet::new();
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Compiled form of [`Exclusions`]; `matches` is true when the item survives.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    fits: AHashSet<String>,
    patterns: AHashSet<String>,
    max_price: Option<u64>,
}

impl ExclusionFilter {
    pub fn excludes(&self, item: &ItemRecord) -> bool {
        self.fits.contains(item.fit.trim())
            || self.patterns.contains(item.pattern.trim())
            || self
                .max_price
                .is_some_and(|max| item.price.map_or(true, |price| price > max))
    }
}

impl Filter for ExclusionFilter {
    fn matches(&self, item: &ItemRecord) -> bool {
        !self.excludes(item)
    }
}
