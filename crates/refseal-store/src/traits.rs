use refseal_types::{Hash, HashAlgorithm};

use crate::error::StoreError;
use crate::object::{CommitObject, TagObject, TreeEntry, TreeObject};

/// Capability facade over the underlying repository.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; content addressing guarantees that
///   the same bytes always produce the same id.
/// - Reference updates are atomic compare-and-swap operations. An absent
///   reference reads as the zero hash for CAS purposes, so an expected-old of
///   zero means "must not exist, or still empty".
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// The digest algorithm this repository uses. Every hash handed to or
    /// returned by the store uses this algorithm.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// Canonical id of the empty tree for the repository's algorithm.
    fn empty_tree(&self) -> Hash {
        self.hash_algorithm().empty_tree()
    }

    /// Read the tip of a reference.
    ///
    /// Returns `NotFound` if the reference does not exist. A reference that
    /// exists but points at the zero hash reads as the zero hash.
    fn read_ref(&self, name: &str) -> Result<Hash, StoreError>;

    /// Atomically update (or create) a reference.
    ///
    /// The update applies only if the reference currently points at
    /// `expected_old` (treating an absent reference as zero); otherwise
    /// `CasConflict` is returned with the observed value.
    fn create_or_update_ref(
        &self,
        name: &str,
        new: &Hash,
        expected_old: &Hash,
    ) -> Result<(), StoreError>;

    /// Write a commit with at most one parent and return its id.
    ///
    /// When `sign` is true the commit payload is signed by the store's
    /// ambient signer; `SignerUnavailable` if none is configured. More than
    /// one parent is rejected with `TooManyParents`; merge commits reach the
    /// store only through the underlying repository, never through this
    /// facade.
    fn write_commit(
        &self,
        tree: &Hash,
        parents: &[Hash],
        message: &str,
        sign: bool,
    ) -> Result<Hash, StoreError>;

    /// Read a commit by id. `NotFound` if absent or not a commit.
    fn read_commit(&self, id: &Hash) -> Result<CommitObject, StoreError>;

    /// Write a blob and return its id. Idempotent.
    fn write_blob(&self, data: &[u8]) -> Result<Hash, StoreError>;

    /// Read a blob by id.
    fn read_blob(&self, id: &Hash) -> Result<Vec<u8>, StoreError>;

    /// Write a tree object and return its id. The empty entry list yields
    /// the canonical empty tree id.
    fn write_tree(&self, entries: &[TreeEntry]) -> Result<Hash, StoreError>;

    /// Read a tree by id.
    fn read_tree(&self, id: &Hash) -> Result<TreeObject, StoreError>;

    /// Write an annotated tag object pointing at `target`.
    fn write_tag(
        &self,
        target: &Hash,
        name: &str,
        message: &str,
        sign: bool,
    ) -> Result<Hash, StoreError>;

    /// Read a tag by id.
    fn read_tag(&self, id: &Hash) -> Result<TagObject, StoreError>;

    /// True iff `ancestor` is reachable from `descendant` via parent edges.
    /// A commit is reachable from itself.
    fn knows_commit(&self, ancestor: &Hash, descendant: &Hash) -> Result<bool, StoreError>;
}
