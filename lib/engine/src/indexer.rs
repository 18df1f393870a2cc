//! Builds a [`CategoryIndex`] from crawled items.
//!
//! Crawled rows and generated descriptions are joined by product id. Rows
//! without a generated description get one put together from their name, fit
//! and pattern so that every item still has text to embed.

use crate::collaborators::Embedder;
use ahash::{AHashMap, AHashSet};
use lookbook_core::{Category, CategoryIndex, Distance, Error, ItemId, ItemRecord, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct DescriptionRow {
    #[serde(alias = "product_id")]
    id: ItemId,
    description: String,
}

/// Parse `{"product_id", "description"}` JSON lines. Later rows for the same
/// id win.
pub fn parse_descriptions(text: &str) -> Result<AHashMap<ItemId, String>> {
    let mut descriptions = AHashMap::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: DescriptionRow = serde_json::from_str(line)
            .map_err(|e| Error::Serialization(format!("line {}: {}", i + 1, e)))?;
        descriptions.insert(row.id, row.description);
    }
    Ok(descriptions)
}

fn synthesize_description(item: &ItemRecord) -> String {
    [item.brand.as_str(), item.name.as_str(), item.fit.as_str(), item.pattern.as_str()]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct IndexBuilder<'a> {
    category: Category,
    distance: Distance,
    embedder: &'a dyn Embedder,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(category: Category, embedder: &'a dyn Embedder) -> Self {
        Self {
            category,
            distance: Distance::default(),
            embedder,
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Embed every item and assemble the index.
    ///
    /// Crawl dumps may mix categories: rows whose category names another one
    /// are skipped, rows with a blank or unrecognised category are kept.
    /// Repeated product ids keep their first row. An explicit description
    /// replaces whatever the crawled row carried.
    pub fn build(
        &self,
        items: Vec<ItemRecord>,
        descriptions: &AHashMap<ItemId, String>,
    ) -> Result<CategoryIndex> {
        let mut seen = AHashSet::with_capacity(items.len());
        let mut records = Vec::with_capacity(items.len());
        let mut vectors = Vec::with_capacity(items.len());
        let mut synthesized = 0usize;
        let mut foreign = 0usize;
        let mut dim = None;

        for mut item in items {
            if matches!(item.category.parse::<Category>(), Ok(c) if c != self.category) {
                foreign += 1;
                continue;
            }
            if !seen.insert(item.id.clone()) {
                warn!(item_id = %item.id, "duplicate crawled row skipped");
                continue;
            }

            if let Some(description) = descriptions.get(&item.id) {
                item.description = description.clone();
            } else if item.description.trim().is_empty() {
                item.description = synthesize_description(&item);
                synthesized += 1;
            }

            let vector = self.embedder.embed(&item.description)?;
            match dim {
                None => dim = Some(vector.dim()),
                Some(expected) if expected != vector.dim() => {
                    return Err(Error::InvalidDimension {
                        expected,
                        actual: vector.dim(),
                    })
                }
                Some(_) => {}
            }
            debug!(item_id = %item.id, "item embedded");
            vectors.push((item.id.clone(), vector));
            records.push(item);
        }

        if foreign > 0 {
            info!(category = %self.category, skipped = foreign, "rows of other categories skipped");
        }

        let model_id = self.embedder.model_id();
        let Some(dim) = dim else {
            warn!(category = %self.category, "no items to index");
            return Ok(CategoryIndex::empty(self.category).with_embedder(model_id));
        };

        info!(
            category = %self.category,
            items = records.len(),
            synthesized,
            dim,
            embedder = %model_id,
            "category index built"
        );
        Ok(CategoryIndex::new(self.category, self.distance, dim, records, vectors)?
            .with_embedder(model_id))
    }
}
