use crate::{Category, Error, ItemId, ItemRecord, Result, Vector};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl Distance {
    /// Similarity of `vector` to `query`; higher is closer for every metric.
    #[inline]
    pub fn score(self, query: &Vector, vector: &Vector) -> f32 {
        match self {
            Distance::Cosine => vector.cosine_similarity(query),
            Distance::Euclidean => -vector.l2_distance(query),
            Distance::Dot => vector.dot(query),
        }
    }
}

impl FromStr for Distance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Cosine" | "cosine" => Ok(Distance::Cosine),
            "Euclidean" | "euclidean" => Ok(Distance::Euclidean),
            "Dot" | "dot" => Ok(Distance::Dot),
            other => Err(Error::InvalidConfig(format!("unknown distance: {}", other))),
        }
    }
}

/// One indexed item: metadata plus its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub record: ItemRecord,
    pub vector: Vector,
}

impl IndexEntry {
    #[inline]
    pub fn id(&self) -> &ItemId {
        &self.record.id
    }
}

/// Read-only metadata table and vector index for one category.
///
/// Every item has exactly one vector and every vector belongs to an item;
/// construction rejects anything else. Entries are kept in ascending id order.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    category: Category,
    distance: Distance,
    vector_dim: usize,
    entries: Vec<IndexEntry>,
    positions: AHashMap<ItemId, usize>,
    embedder: Option<String>,
}

impl CategoryIndex {
    pub fn new(
        category: Category,
        distance: Distance,
        vector_dim: usize,
        items: Vec<ItemRecord>,
        vectors: Vec<(ItemId, Vector)>,
    ) -> Result<Self> {
        let mut by_id: AHashMap<ItemId, ItemRecord> = AHashMap::with_capacity(items.len());
        for item in items {
            let id = item.id.clone();
            if by_id.insert(id.clone(), item).is_some() {
                return Err(Error::IndexMismatch(format!("duplicate item id {}", id)));
            }
        }

        let mut seen: AHashSet<ItemId> = AHashSet::with_capacity(vectors.len());
        let mut entries = Vec::with_capacity(vectors.len());
        for (id, vector) in vectors {
            if vector.dim() != vector_dim {
                return Err(Error::InvalidDimension {
                    expected: vector_dim,
                    actual: vector.dim(),
                });
            }
            if !seen.insert(id.clone()) {
                return Err(Error::IndexMismatch(format!("duplicate vector id {}", id)));
            }
            let record = by_id
                .remove(&id)
                .ok_or_else(|| Error::IndexMismatch(format!("vector {} has no metadata", id)))?;
            entries.push(IndexEntry { record, vector });
        }

        if let Some(orphan) = by_id.keys().min() {
            return Err(Error::IndexMismatch(format!(
                "{} item(s) without a vector, first: {}",
                by_id.len(),
                orphan
            )));
        }

        entries.sort_by(|a, b| a.id().cmp(b.id()));
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id().clone(), i))
            .collect();

        Ok(Self {
            category,
            distance,
            vector_dim,
            entries,
            positions,
            embedder: None,
        })
    }

    pub fn empty(category: Category) -> Self {
        Self {
            category,
            distance: Distance::default(),
            vector_dim: 0,
            entries: Vec::new(),
            positions: AHashMap::new(),
            embedder: None,
        }
    }

    /// Record the embedder model the vectors came from.
    #[must_use]
    pub fn with_embedder(mut self, model_id: impl Into<String>) -> Self {
        self.embedder = Some(model_id.into());
        self
    }

    /// Model id of the embedder that produced the vectors, when known.
    pub fn embedder(&self) -> Option<&str> {
        self.embedder.as_deref()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn vector_dim(&self) -> usize {
        self.vector_dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&IndexEntry> {
        self.positions.get(id).map(|&i| &self.entries[i])
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}
