//! # Lookbook Core
//!
//! Core data structures for the Lookbook recommendation flow.
//!
//! - [`Category`] / [`Progress`] - the fixed outfit sequence and a session's place in it
//! - [`Session`] - persona, exclusions, context terms and selections of one user
//! - [`PersonaCatalog`] - persona presets
//! - [`Exclusions`] / [`ExclusionFilter`] - hard negative filters
//! - [`CategoryIndex`] - per-category metadata table plus vector index
//!
//! ## Example
//!
//! ```rust
//! use lookbook_core::{Category, Selection, Session};
//!
//! let mut session = Session::new("demo");
//! assert_eq!(session.current_category(), Some(Category::Top));
//!
//! let outcome = session
//!     .record_selection(Selection::new("42", "top", "Logo Knit", "https://img/42.jpg"))
//!     .unwrap();
//! assert_eq!(outcome.next_category, Some(Category::Bottom));
//! ```

pub mod category;
pub mod error;
pub mod filter;
pub mod index;
pub mod item;
pub mod persona;
pub mod session;
pub mod vector;

pub use category::{Category, Progress};
pub use error::{Error, ErrorKind, Result};
pub use filter::{ExclusionFilter, Exclusions, Filter};
pub use index::{CategoryIndex, Distance, IndexEntry};
pub use item::{ItemId, ItemRecord};
pub use persona::{Persona, PersonaCatalog};
pub use session::{SelectOutcome, Selection, Session, SessionPhase};
pub use vector::Vector;
