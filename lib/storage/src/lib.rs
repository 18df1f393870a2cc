pub mod manager;
pub mod persistence;
pub mod sessions;

pub use manager::{DiskIndexLoader, IndexLoader, IndexStore};
pub use persistence::{read_category_index, write_category_index, IndexManifest};
pub use sessions::{
    spawn_session_reaper, InMemorySessionStore, SessionHandle, SessionLookup, SessionStore,
};
