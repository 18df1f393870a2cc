//! Interfaces to the services the recommendation flow depends on.
//!
//! All three are synchronous. Implementations may block on I/O; the API layer
//! runs calls that reach them on a blocking thread pool.

use lookbook_core::{Result, Vector};

/// Turns text into a query vector.
///
/// A failure here aborts the recommend call that needed it.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vector>;

    /// Identifies the model and the settings that shape its vectors. An index
    /// is only queried by an embedder reporting the id it was built with.
    fn model_id(&self) -> String;
}

/// Splits free-text time/place/occasion input into normalized terms.
///
/// Callers treat an error as "no terms".
pub trait ContextParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<String>>;
}

/// Explains why an item fits the composed context.
///
/// Callers treat an error as an empty explanation.
pub trait Justifier: Send + Sync {
    fn justify(&self, description: &str, context: &str) -> Result<String>;
}
