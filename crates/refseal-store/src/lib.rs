//! Object store capability facade.
//!
//! The ledger core reads and writes repository objects exclusively through
//! the [`ObjectStore`] trait: blobs, trees, commits, tags, and references
//! with compare-and-swap updates, plus ancestry tests. A production driver
//! wraps the real repository; [`InMemoryObjectStore`] keeps the core
//! testable without one.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::StoreError;
pub use memory::InMemoryObjectStore;
pub use object::{CommitObject, EntryMode, TagObject, TreeEntry, TreeObject};
pub use traits::ObjectStore;
