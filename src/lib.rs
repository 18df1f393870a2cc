//! # Lookbook
//!
//! A step-by-step outfit recommender. A session walks the fixed category
//! sequence top → bottom → outerwear → bag → shoes; at each step the
//! persona, the stated time/place/occasion and the items already picked are
//! folded into one query, embedded, and matched against that category's
//! index with the user's exclusions applied as hard filters.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! lookbook build-index --category top --items tops.jsonl --descriptions tops_desc.jsonl
//! lookbook serve --data-dir ./data --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use lookbook::prelude::*;
//! use std::sync::Arc;
//!
//! let embedder = HashingEmbedder::default();
//! let tops = vec![ItemRecord::new("101")
//!     .with_name("Logo Hoodie")
//!     .with_description("oversized black logo hoodie")];
//! let vectors = tops
//!     .iter()
//!     .map(|item| (item.id.clone(), embedder.embed(&item.description).unwrap()))
//!     .collect();
//! let index = CategoryIndex::new(Category::Top, Distance::Cosine, embedder.dim(), tops, vectors).unwrap();
//!
//! let indices = Arc::new(IndexStore::open("./data"));
//! indices.insert(index);
//!
//! let service = LookbookService::new(ServiceConfig::default(), indices);
//! service.set_persona("demo", "street").unwrap();
//! let recommendations = service.recommend("demo").unwrap();
//! assert_eq!(recommendations.category, Category::Top);
//! assert_eq!(recommendations.items[0].item_id.as_str(), "101");
//! ```
//!
//! ## Crate Structure
//!
//! - `lookbook-core` - categories, sessions, personas, exclusions, category indices
//! - `lookbook-storage` - on-disk index layout, the index cache, the session table
//! - `lookbook-engine` - collaborators, query composition, retrieval, the step flow
//! - `lookbook-api` - REST API

// Re-export core types
pub use lookbook_core::{
    Category, CategoryIndex, Distance, Error, ErrorKind, ExclusionFilter, Exclusions, Filter,
    ItemId, ItemRecord, Persona, PersonaCatalog, Progress, Result, SelectOutcome, Selection,
    Session, SessionPhase, Vector,
};

// Re-export storage
pub use lookbook_storage::{
    DiskIndexLoader, IndexLoader, IndexStore, InMemorySessionStore, SessionStore,
};

// Re-export engine
pub use lookbook_engine::{
    ContextParser, Embedder, HashingEmbedder, IndexBuilder, Justifier, KeywordContextParser,
    LookbookService, LookbookView, QueryComposer, Recommendation, Recommendations,
    RetrievalEngine, ServiceConfig, TemplateJustifier,
};

// Re-export API
pub use lookbook_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Category, CategoryIndex, Distance, Embedder, Error, Exclusions, HashingEmbedder,
        IndexStore, ItemRecord, LookbookService, PersonaCatalog, Result, ServiceConfig, Vector,
    };
}
