use lookbook_core::{Category, CategoryIndex, Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::persistence;

/// Source of category indices.
pub trait IndexLoader: Send + Sync {
    /// Load the index for `category`. A category with no stored index is
    /// reported as [`Error::StorageUnavailable`].
    fn load(&self, category: Category) -> Result<CategoryIndex>;
}

/// Loads indices from `<data_dir>/<category>/`.
pub struct DiskIndexLoader {
    data_dir: PathBuf,
}

impl DiskIndexLoader {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }
}

impl IndexLoader for DiskIndexLoader {
    fn load(&self, category: Category) -> Result<CategoryIndex> {
        if !persistence::index_exists(&self.data_dir, category) {
            return Err(Error::StorageUnavailable(format!(
                "no index for {} under {:?}",
                category, self.data_dir
            )));
        }
        persistence::read_category_index(&self.data_dir, category)
            .map_err(|e| Error::Storage(format!("{:#}", e)))
    }
}

/// Process-wide cache of category indices.
///
/// Lookups of cached categories only take the read lock. The first request
/// for a category loads it under that category's gate, so concurrent first
/// requests wait for one load instead of repeating it. Failed loads are not
/// cached.
pub struct IndexStore {
    loader: Box<dyn IndexLoader>,
    indices: RwLock<HashMap<Category, Arc<CategoryIndex>>>,
    gates: [Mutex<()>; Category::ALL.len()],
    loads: AtomicUsize,
}

impl IndexStore {
    pub fn new<L: IndexLoader + 'static>(loader: L) -> Self {
        Self {
            loader: Box::new(loader),
            indices: RwLock::new(HashMap::new()),
            gates: Default::default(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Store backed by index files under `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(DiskIndexLoader::new(data_dir))
    }

    #[inline]
    fn cached(&self, category: Category) -> Option<Arc<CategoryIndex>> {
        self.indices.read().get(&category).cloned()
    }

    pub fn get(&self, category: Category) -> Result<Arc<CategoryIndex>> {
        if let Some(index) = self.cached(category) {
            return Ok(index);
        }

        let _gate = self.gates[category.index()].lock();
        if let Some(index) = self.cached(category) {
            return Ok(index);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let index = Arc::new(self.loader.load(category)?);
        debug!(%category, items = index.len(), "category index loaded");
        self.indices.write().insert(category, index.clone());
        Ok(index)
    }

    /// Install an index directly, replacing any cached one.
    pub fn insert(&self, index: CategoryIndex) -> Arc<CategoryIndex> {
        let index = Arc::new(index);
        self.indices.write().insert(index.category(), index.clone());
        index
    }

    /// Load every category; returns how many are available.
    pub fn preload(&self) -> usize {
        let mut available = 0;
        for category in Category::ALL {
            match self.get(category) {
                Ok(index) => {
                    info!(%category, items = index.len(), "index ready");
                    available += 1;
                }
                Err(e) => warn!(%category, error = %e, "index not available"),
            }
        }
        available
    }

    /// Cached categories in sequence order.
    #[must_use]
    pub fn loaded_categories(&self) -> Vec<Category> {
        let indices = self.indices.read();
        Category::ALL
            .into_iter()
            .filter(|c| indices.contains_key(c))
            .collect()
    }

    /// Number of loader calls made so far.
    #[inline]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
