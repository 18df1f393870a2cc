use lookbook_core::{
    Category, CategoryIndex, Error, Exclusions, Filter, IndexEntry, ItemRecord, Result, Vector,
};
use lookbook_storage::IndexStore;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Indices at least this large are scored on the rayon pool.
const PARALLEL_THRESHOLD: usize = 4096;

#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub category: Category,
    pub query: Vector,
    /// Model id of the embedder that produced `query`.
    pub embedder: String,
    pub exclusions: Exclusions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    pub item: ItemRecord,
    pub score: f32,
}

/// Brute-force similarity search over one category, with hard exclusions.
pub struct RetrievalEngine {
    store: Arc<IndexStore>,
    result_cap: usize,
}

impl RetrievalEngine {
    pub fn new(store: Arc<IndexStore>, result_cap: usize) -> Self {
        Self { store, result_cap }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Top items for the request's category.
    ///
    /// An index that cannot be loaded answers with no items.
    pub fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<ScoredItem>> {
        let index = match self.store.get(request.category) {
            Ok(index) => index,
            Err(e) => {
                warn!(category = %request.category, error = %e, "index unavailable, returning no items");
                return Ok(Vec::new());
            }
        };

        Self::check_embedder(&index, &request.embedder)?;

        let filter = request.exclusions.to_filter();
        let results = Self::rank(&index, &request.query, &filter, self.result_cap)?;
        debug!(
            category = %request.category,
            candidates = index.len(),
            returned = results.len(),
            "retrieval finished"
        );
        Ok(results)
    }

    /// Fails when `index` records an embedder other than `model_id`.
    pub fn check_embedder(index: &CategoryIndex, model_id: &str) -> Result<()> {
        match index.embedder() {
            Some(built_with) if built_with != model_id => Err(Error::IndexMismatch(format!(
                "{} index was built with embedder {}, queries use {}",
                index.category(),
                built_with,
                model_id
            ))),
            _ => Ok(()),
        }
    }

    /// Score every entry, drop the ones `filter` rejects and keep the best
    /// `limit` by descending score, ties in ascending id order.
    pub fn rank(
        index: &CategoryIndex,
        query: &Vector,
        filter: &dyn Filter,
        limit: usize,
    ) -> Result<Vec<ScoredItem>> {
        if index.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        if query.dim() != index.vector_dim() {
            return Err(Error::InvalidDimension {
                expected: index.vector_dim(),
                actual: query.dim(),
            });
        }

        let distance = index.distance();
        let scored = |(position, entry): (usize, &IndexEntry)| {
            if filter.matches(&entry.record) {
                let s = distance.score(query, &entry.vector);
                Some((if s.is_nan() { f32::NEG_INFINITY } else { s }, position))
            } else {
                None
            }
        };

        let mut hits: Vec<(f32, usize)> = if index.len() >= PARALLEL_THRESHOLD {
            index.entries().par_iter().enumerate().filter_map(scored).collect()
        } else {
            index.entries().iter().enumerate().filter_map(scored).collect()
        };

        // Entries are stored in ascending id order, so position breaks ties.
        let order = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
            OrderedFloat(b.0).cmp(&OrderedFloat(a.0)).then(a.1.cmp(&b.1))
        };
        if hits.len() > limit {
            hits.select_nth_unstable_by(limit - 1, order);
            hits.truncate(limit);
        }
        hits.sort_unstable_by(order);

        let entries = index.entries();
        Ok(hits
            .into_iter()
            .map(|(score, position)| ScoredItem {
                item: entries[position].record.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookbook_core::{Distance, ExclusionFilter, ItemId};
    use lookbook_storage::IndexLoader;

    fn index(items: Vec<(ItemRecord, Vec<f32>)>) -> CategoryIndex {
        let dim = items.first().map(|(_, v)| v.len()).unwrap_or(0);
        let vectors = items
            .iter()
            .map(|(r, v)| (r.id.clone(), Vector::new(v.clone())))
            .collect();
        let records = items.into_iter().map(|(r, _)| r).collect();
        CategoryIndex::new(Category::Top, Distance::Cosine, dim, records, vectors).unwrap()
    }

    fn ids(results: &[ScoredItem]) -> Vec<&str> {
        results.iter().map(|r| r.item.id.as_str()).collect()
    }

    struct NoIndex;

    impl IndexLoader for NoIndex {
        fn load(&self, category: Category) -> Result<CategoryIndex> {
            Err(Error::StorageUnavailable(category.to_string()))
        }
    }

    #[test]
    fn test_excluded_fit_dropped_even_when_closest() {
        let idx = index(vec![
            (ItemRecord::new("1").with_fit("slim"), vec![1.0, 0.0]),
            (ItemRecord::new("2").with_fit("regular"), vec![0.6, 0.8]),
        ]);
        let filter = Exclusions::new(["slim"], Vec::<String>::new(), None).to_filter();
        let results =
            RetrievalEngine::rank(&idx, &Vector::new(vec![1.0, 0.0]), &filter, 5).unwrap();
        assert_eq!(ids(&results), vec!["2"]);
    }

    #[test]
    fn test_price_threshold_keeps_equal_price() {
        let idx = index(vec![
            (ItemRecord::new("1").with_price(45_000), vec![1.0, 0.0]),
            (ItemRecord::new("2").with_price(50_000), vec![1.0, 0.1]),
            (ItemRecord::new("3").with_price(60_000), vec![1.0, 0.0]),
        ]);
        let filter = Exclusions::new(Vec::<String>::new(), Vec::<String>::new(), Some(50_000))
            .to_filter();
        let results =
            RetrievalEngine::rank(&idx, &Vector::new(vec![1.0, 0.0]), &filter, 5).unwrap();
        assert_eq!(ids(&results), vec!["1", "2"]);
        assert!(results.iter().all(|r| r.item.price <= Some(50_000)));
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let idx = index(vec![
            (ItemRecord::new("10"), vec![1.0, 0.0]),
            (ItemRecord::new("9"), vec![1.0, 0.0]),
            (ItemRecord::new("abc"), vec![1.0, 0.0]),
            (ItemRecord::new("2"), vec![0.0, 1.0]),
        ]);
        let query = Vector::new(vec![1.0, 0.0]);
        let filter = ExclusionFilter::default();
        let first = RetrievalEngine::rank(&idx, &query, &filter, 3).unwrap();
        assert_eq!(ids(&first), vec!["9", "10", "abc"]);
        for _ in 0..10 {
            assert_eq!(ids(&RetrievalEngine::rank(&idx, &query, &filter, 3).unwrap()), ids(&first));
        }
    }

    #[test]
    fn test_limit_larger_than_survivors() {
        let idx = index(vec![
            (ItemRecord::new("1"), vec![1.0, 0.0]),
            (ItemRecord::new("2"), vec![0.0, 1.0]),
        ]);
        let results = RetrievalEngine::rank(
            &idx,
            &Vector::new(vec![0.0, 1.0]),
            &ExclusionFilter::default(),
            10,
        )
        .unwrap();
        assert_eq!(ids(&results), vec!["2", "1"]);
    }

    #[test]
    fn test_nan_scores_sort_last() {
        let idx = index(vec![
            (ItemRecord::new("1"), vec![f32::NAN, 0.0]),
            (ItemRecord::new("2"), vec![0.0, 1.0]),
        ]);
        let results = RetrievalEngine::rank(
            &idx,
            &Vector::new(vec![0.0, 1.0]),
            &ExclusionFilter::default(),
            5,
        )
        .unwrap();
        assert_eq!(ids(&results), vec!["2", "1"]);
    }

    #[test]
    fn test_wrong_query_dimension() {
        let idx = index(vec![(ItemRecord::new("1"), vec![1.0, 0.0])]);
        let err = RetrievalEngine::rank(
            &idx,
            &Vector::new(vec![1.0, 0.0, 0.0]),
            &ExclusionFilter::default(),
            5,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { expected: 2, actual: 3 }));
        // A query/index mismatch is a deployment fault, not a bad request.
        assert_eq!(err.kind(), lookbook_core::ErrorKind::Internal);
    }

    #[test]
    fn test_parallel_path_matches_sequential_order() {
        let items: Vec<(ItemRecord, Vec<f32>)> = (0..PARALLEL_THRESHOLD as u64 + 10)
            .map(|i| (ItemRecord::new(i), vec![(i % 7) as f32, 1.0]))
            .collect();
        let idx = index(items);
        let results = RetrievalEngine::rank(
            &idx,
            &Vector::new(vec![6.0, 1.0]),
            &ExclusionFilter::default(),
            4,
        )
        .unwrap();
        let expected: Vec<ItemId> = [6u64, 13, 20, 27].into_iter().map(ItemId::from).collect();
        assert_eq!(results.iter().map(|r| r.item.id.clone()).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_missing_index_is_empty_result() {
        let engine = RetrievalEngine::new(Arc::new(IndexStore::new(NoIndex)), 5);
        let request = RetrievalRequest {
            category: Category::Shoes,
            query: Vector::new(vec![1.0]),
            embedder: "hashing-xxh3/1".to_string(),
            exclusions: Exclusions::default(),
        };
        assert!(engine.retrieve(&request).unwrap().is_empty());
    }

    #[test]
    fn test_empty_index_is_empty_result() {
        let store = Arc::new(IndexStore::new(NoIndex));
        store.insert(CategoryIndex::empty(Category::Bag));
        let engine = RetrievalEngine::new(store, 5);
        let request = RetrievalRequest {
            category: Category::Bag,
            query: Vector::new(vec![1.0, 2.0]),
            embedder: "hashing-xxh3/2".to_string(),
            exclusions: Exclusions::default(),
        };
        assert!(engine.retrieve(&request).unwrap().is_empty());
    }

    #[test]
    fn test_index_from_other_embedder_rejected() {
        let store = Arc::new(IndexStore::new(NoIndex));
        store.insert(
            index(vec![(ItemRecord::new("1"), vec![1.0, 0.0])]).with_embedder("hashing-xxh3/2"),
        );
        let engine = RetrievalEngine::new(store, 5);
        let mut request = RetrievalRequest {
            category: Category::Top,
            query: Vector::new(vec![1.0, 0.0]),
            embedder: "openai/text-embedding-3-small".to_string(),
            exclusions: Exclusions::default(),
        };
        let err = engine.retrieve(&request).unwrap_err();
        assert!(matches!(err, Error::IndexMismatch(_)));
        assert_eq!(err.kind(), lookbook_core::ErrorKind::Internal);

        request.embedder = "hashing-xxh3/2".to_string();
        assert_eq!(ids(&engine.retrieve(&request).unwrap()), vec!["1"]);
    }
}
