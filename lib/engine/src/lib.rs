//! # Lookbook Engine
//!
//! Turns session state into recommendations.
//!
//! - [`LookbookService`] - one method per step of the flow, over a [`SessionStore`](lookbook_storage::SessionStore)
//! - [`QueryComposer`] - persona, context and earlier picks folded into one query text
//! - [`RetrievalEngine`] - scored, filtered, deterministically ordered top-K per category
//! - [`Embedder`], [`ContextParser`], [`Justifier`] - collaborator seams, with offline
//!   defaults and OpenAI-compatible HTTP clients
//! - [`IndexBuilder`] - embeds crawled items into a category index

pub mod collaborators;
pub mod composer;
pub mod hashing;
pub mod indexer;
pub mod justify;
pub mod openai;
pub mod parser;
pub mod retrieval;
pub mod service;

pub use collaborators::{ContextParser, Embedder, Justifier};
pub use composer::QueryComposer;
pub use hashing::{HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use indexer::{parse_descriptions, IndexBuilder};
pub use justify::TemplateJustifier;
pub use openai::{OpenAiConfig, OpenAiEmbedder, OpenAiJustifier, DEFAULT_API_BASE};
pub use parser::KeywordContextParser;
pub use retrieval::{RetrievalEngine, RetrievalRequest, ScoredItem};
pub use service::{
    LookbookService, LookbookView, Recommendation, Recommendations, ServiceConfig,
    SessionStatus, DEFAULT_RESULT_CAP,
};
