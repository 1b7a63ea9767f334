//! In-memory object store for testing and ephemeral use.
//!
//! [`InMemoryObjectStore`] keeps objects and references in `HashMap`s behind
//! `RwLock`s. Object ids are computed git-style, `"<kind> <len>\0"` header
//! plus payload under the configured algorithm, so blob ids and the empty
//! tree id match what the real repository would produce.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use refseal_sign::CommitSigner;
use refseal_types::{Hash, HashAlgorithm};
use tracing::debug;

use crate::error::StoreError;
use crate::object::{CommitObject, TagObject, TreeEntry, TreeObject};
use crate::traits::ObjectStore;

#[derive(Clone, Debug)]
enum StoredObject {
    Blob(Vec<u8>),
    Tree(TreeObject),
    Commit(CommitObject),
    Tag(TagObject),
}

/// An in-memory implementation of [`ObjectStore`].
///
/// All data lives behind `RwLock`s and is lost when the store is dropped.
/// Commit timestamps come from a logical counter so runs are deterministic.
pub struct InMemoryObjectStore {
    algorithm: HashAlgorithm,
    objects: RwLock<HashMap<Hash, StoredObject>>,
    refs: RwLock<HashMap<String, Hash>>,
    signer: Option<Arc<dyn CommitSigner>>,
    author: String,
    clock: AtomicU64,
}

impl InMemoryObjectStore {
    /// Create an unsigned store using SHA-1 addressing.
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::Sha1)
    }

    /// Create an unsigned store with the given algorithm.
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            objects: RwLock::new(HashMap::new()),
            refs: RwLock::new(HashMap::new()),
            signer: None,
            author: "refseal <refseal@localhost>".to_string(),
            clock: AtomicU64::new(1),
        }
    }

    /// Attach an ambient signer; commits and tags written with `sign = true`
    /// are signed with it.
    pub fn with_signer(mut self, signer: Arc<dyn CommitSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    fn object_id(&self, kind: &str, payload: &[u8]) -> Hash {
        let mut framed = Vec::with_capacity(payload.len() + kind.len() + 16);
        framed.extend_from_slice(kind.as_bytes());
        framed.extend_from_slice(format!(" {}\0", payload.len()).as_bytes());
        framed.extend_from_slice(payload);
        self.algorithm.digest(&framed)
    }

    fn insert(&self, id: Hash, object: StoredObject) -> Result<(), StoreError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        objects.insert(id, object);
        Ok(())
    }

    fn get(&self, id: &Hash) -> Result<StoredObject, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        objects.get(id).cloned().ok_or(StoreError::NotFound)
    }

    /// Insert a commit without the single-parent check.
    ///
    /// This is the out-of-band path a hostile or broken writer would use;
    /// tests use it to build user history with merge commits and to inject
    /// malformed ledger entries.
    pub fn insert_commit_unchecked(&self, commit: CommitObject) -> Result<Hash, StoreError> {
        let id = self.object_id("commit", &commit.object_bytes());
        self.insert(id.clone(), StoredObject::Commit(commit))?;
        Ok(id)
    }

    /// Build and insert a commit with arbitrary parents, no signing.
    /// Test-fixture convenience around [`Self::insert_commit_unchecked`].
    pub fn commit_with_parents(
        &self,
        tree: &Hash,
        parents: &[Hash],
        message: &str,
    ) -> Result<Hash, StoreError> {
        self.insert_commit_unchecked(CommitObject {
            tree: tree.clone(),
            parents: parents.to_vec(),
            author: self.author.clone(),
            timestamp: self.clock.fetch_add(1, Ordering::SeqCst),
            message: message.to_string(),
            signature: None,
        })
    }

    /// Point a reference at a hash unconditionally. Test-fixture use only;
    /// ledger writers always go through the CAS path.
    pub fn set_ref_unchecked(&self, name: &str, id: &Hash) -> Result<(), StoreError> {
        let mut refs = self
            .refs
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        refs.insert(name.to_string(), id.clone());
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn hash_algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn read_ref(&self, name: &str) -> Result<Hash, StoreError> {
        let refs = self
            .refs
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        refs.get(name).cloned().ok_or(StoreError::NotFound)
    }

    fn create_or_update_ref(
        &self,
        name: &str,
        new: &Hash,
        expected_old: &Hash,
    ) -> Result<(), StoreError> {
        let mut refs = self
            .refs
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        let current = refs
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.algorithm.zero());
        if current != *expected_old {
            return Err(StoreError::CasConflict {
                reference: name.to_string(),
                expected: expected_old.clone(),
                actual: current,
            });
        }
        debug!(reference = name, new = %new, "reference updated");
        refs.insert(name.to_string(), new.clone());
        Ok(())
    }

    fn write_commit(
        &self,
        tree: &Hash,
        parents: &[Hash],
        message: &str,
        sign: bool,
    ) -> Result<Hash, StoreError> {
        if parents.len() > 1 {
            return Err(StoreError::TooManyParents(parents.len()));
        }

        let mut commit = CommitObject {
            tree: tree.clone(),
            parents: parents.to_vec(),
            author: self.author.clone(),
            timestamp: self.clock.fetch_add(1, Ordering::SeqCst),
            message: message.to_string(),
            signature: None,
        };

        if sign {
            let signer = self.signer.as_ref().ok_or(StoreError::SignerUnavailable)?;
            commit.signature = Some(signer.sign(&commit.payload_bytes())?);
        }

        self.insert_commit_unchecked(commit)
    }

    fn read_commit(&self, id: &Hash) -> Result<CommitObject, StoreError> {
        match self.get(id)? {
            StoredObject::Commit(commit) => Ok(commit),
            _ => Err(StoreError::WrongKind(id.clone())),
        }
    }

    fn write_blob(&self, data: &[u8]) -> Result<Hash, StoreError> {
        let id = self.object_id("blob", data);
        self.insert(id.clone(), StoredObject::Blob(data.to_vec()))?;
        Ok(id)
    }

    fn read_blob(&self, id: &Hash) -> Result<Vec<u8>, StoreError> {
        match self.get(id)? {
            StoredObject::Blob(data) => Ok(data),
            _ => Err(StoreError::WrongKind(id.clone())),
        }
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<Hash, StoreError> {
        let tree = TreeObject {
            entries: entries.to_vec(),
        };
        let id = self.object_id("tree", &tree.canonical_bytes());
        self.insert(id.clone(), StoredObject::Tree(tree))?;
        Ok(id)
    }

    fn read_tree(&self, id: &Hash) -> Result<TreeObject, StoreError> {
        match self.get(id)? {
            StoredObject::Tree(tree) => Ok(tree),
            _ => Err(StoreError::WrongKind(id.clone())),
        }
    }

    fn write_tag(
        &self,
        target: &Hash,
        name: &str,
        message: &str,
        sign: bool,
    ) -> Result<Hash, StoreError> {
        let mut tag = TagObject {
            target: target.clone(),
            name: name.to_string(),
            message: message.to_string(),
            signature: None,
        };
        if sign {
            let signer = self.signer.as_ref().ok_or(StoreError::SignerUnavailable)?;
            tag.signature = Some(signer.sign(&tag.payload_bytes())?);
        }
        let id = self.object_id("tag", &tag.object_bytes());
        self.insert(id.clone(), StoredObject::Tag(tag))?;
        Ok(id)
    }

    fn read_tag(&self, id: &Hash) -> Result<TagObject, StoreError> {
        match self.get(id)? {
            StoredObject::Tag(tag) => Ok(tag),
            _ => Err(StoreError::WrongKind(id.clone())),
        }
    }

    fn knows_commit(&self, ancestor: &Hash, descendant: &Hash) -> Result<bool, StoreError> {
        if ancestor == descendant {
            // Make sure the commit actually exists before answering.
            return self.read_commit(descendant).map(|_| true);
        }

        let mut queue = VecDeque::from([descendant.clone()]);
        let mut seen = std::collections::HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let commit = self.read_commit(&id)?;
            for parent in commit.parents {
                if parent == *ancestor {
                    return Ok(true);
                }
                queue.push_back(parent);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use refseal_sign::Ed25519Signer;
    use refseal_sign::SignatureVerifier;

    use super::*;
    use crate::object::EntryMode;

    fn store() -> InMemoryObjectStore {
        InMemoryObjectStore::new()
    }

    #[test]
    fn blob_roundtrip_and_git_id() {
        let s = store();
        let id = s.write_blob(b"hello\n").unwrap();
        // Real `git hash-object` id for "hello\n".
        assert_eq!(id.as_str(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(s.read_blob(&id).unwrap(), b"hello\n");
    }

    #[test]
    fn blob_write_is_idempotent() {
        let s = store();
        let a = s.write_blob(b"data").unwrap();
        let b = s.write_blob(b"data").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_tree_matches_canonical_constant() {
        let s = store();
        let id = s.write_tree(&[]).unwrap();
        assert_eq!(id, s.empty_tree());
        assert_eq!(id.as_str(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn sha256_store_uses_sha256_empty_tree() {
        let s = InMemoryObjectStore::with_algorithm(HashAlgorithm::Sha256);
        let id = s.write_tree(&[]).unwrap();
        assert_eq!(id, HashAlgorithm::Sha256.empty_tree());
    }

    #[test]
    fn tree_roundtrip() {
        let s = store();
        let blob = s.write_blob(b"content").unwrap();
        let id = s
            .write_tree(&[TreeEntry::new(EntryMode::Regular, "file.txt", blob.clone())])
            .unwrap();
        let tree = s.read_tree(&id).unwrap();
        assert_eq!(tree.entries.len(), 1);
        assert_eq!(tree.entry("file.txt").unwrap().id, blob);
    }

    #[test]
    fn commit_roundtrip() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let id = s.write_commit(&tree, &[], "initial", false).unwrap();
        let commit = s.read_commit(&id).unwrap();
        assert_eq!(commit.tree, tree);
        assert!(commit.parents.is_empty());
        assert_eq!(commit.message, "initial");
        assert!(commit.signature.is_none());
    }

    #[test]
    fn commit_rejects_two_parents() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let a = s.write_commit(&tree, &[], "a", false).unwrap();
        let b = s.write_commit(&tree, &[], "b", false).unwrap();
        let err = s.write_commit(&tree, &[a, b], "merge", false).unwrap_err();
        assert_eq!(err, StoreError::TooManyParents(2));
    }

    #[test]
    fn unchecked_insert_admits_merge_commits() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let a = s.write_commit(&tree, &[], "a", false).unwrap();
        let b = s.write_commit(&tree, &[], "b", false).unwrap();
        let merge = s.commit_with_parents(&tree, &[a.clone(), b], "merge").unwrap();
        assert_eq!(s.read_commit(&merge).unwrap().parents.len(), 2);
        assert!(s.knows_commit(&a, &merge).unwrap());
    }

    #[test]
    fn signing_requires_signer() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let err = s.write_commit(&tree, &[], "signed", true).unwrap_err();
        assert_eq!(err, StoreError::SignerUnavailable);
    }

    #[test]
    fn signed_commit_verifies() {
        let signer = Arc::new(Ed25519Signer::generate());
        let principal = refseal_sign::CommitSigner::principal(signer.as_ref());
        let s = InMemoryObjectStore::new().with_signer(signer);
        let tree = s.write_tree(&[]).unwrap();
        let id = s.write_commit(&tree, &[], "signed", true).unwrap();
        let commit = s.read_commit(&id).unwrap();
        let sig = commit.signature.clone().unwrap();
        refseal_sign::Ed25519Verifier::new()
            .verify(&principal, &commit.payload_bytes(), &sig)
            .unwrap();
    }

    #[test]
    fn read_missing_is_not_found() {
        let s = store();
        let id = HashAlgorithm::Sha1.digest(b"nothing here");
        assert_eq!(s.read_commit(&id).unwrap_err(), StoreError::NotFound);
        assert_eq!(s.read_ref("refs/heads/main").unwrap_err(), StoreError::NotFound);
    }

    #[test]
    fn wrong_kind_reported() {
        let s = store();
        let blob = s.write_blob(b"data").unwrap();
        assert!(matches!(
            s.read_commit(&blob).unwrap_err(),
            StoreError::WrongKind(_)
        ));
    }

    #[test]
    fn cas_creates_when_expected_zero() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let commit = s.write_commit(&tree, &[], "c", false).unwrap();
        let zero = s.hash_algorithm().zero();
        s.create_or_update_ref("refs/heads/main", &commit, &zero).unwrap();
        assert_eq!(s.read_ref("refs/heads/main").unwrap(), commit);
    }

    #[test]
    fn cas_conflict_on_stale_expectation() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let c1 = s.write_commit(&tree, &[], "one", false).unwrap();
        let c2 = s.write_commit(&tree, &[], "two", false).unwrap();
        let zero = s.hash_algorithm().zero();
        s.create_or_update_ref("refs/heads/main", &c1, &zero).unwrap();

        // A second writer that still thinks the ref is empty loses.
        let err = s
            .create_or_update_ref("refs/heads/main", &c2, &zero)
            .unwrap_err();
        assert!(matches!(err, StoreError::CasConflict { actual, .. } if actual == c1));
    }

    #[test]
    fn cas_advances_from_observed_tip() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let c1 = s.write_commit(&tree, &[], "one", false).unwrap();
        let c2 = s.write_commit(&tree, &[c1.clone()], "two", false).unwrap();
        let zero = s.hash_algorithm().zero();
        s.create_or_update_ref("refs/heads/main", &c1, &zero).unwrap();
        s.create_or_update_ref("refs/heads/main", &c2, &c1).unwrap();
        assert_eq!(s.read_ref("refs/heads/main").unwrap(), c2);
    }

    #[test]
    fn knows_commit_linear_chain() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let a = s.write_commit(&tree, &[], "a", false).unwrap();
        let b = s.write_commit(&tree, &[a.clone()], "b", false).unwrap();
        let c = s.write_commit(&tree, &[b.clone()], "c", false).unwrap();
        assert!(s.knows_commit(&a, &c).unwrap());
        assert!(s.knows_commit(&c, &c).unwrap());
        assert!(!s.knows_commit(&c, &a).unwrap());
    }

    #[test]
    fn knows_commit_through_merge() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let root = s.write_commit(&tree, &[], "root", false).unwrap();
        let left = s.write_commit(&tree, &[root.clone()], "left", false).unwrap();
        let right = s.write_commit(&tree, &[root.clone()], "right", false).unwrap();
        let merge = s
            .commit_with_parents(&tree, &[left, right.clone()], "merge")
            .unwrap();
        assert!(s.knows_commit(&root, &merge).unwrap());
        assert!(s.knows_commit(&right, &merge).unwrap());
    }

    #[test]
    fn knows_commit_missing_descendant_errors() {
        let s = store();
        let ghost = HashAlgorithm::Sha1.digest(b"ghost");
        assert_eq!(
            s.knows_commit(&ghost, &ghost).unwrap_err(),
            StoreError::NotFound
        );
    }

    #[test]
    fn tag_roundtrip() {
        let s = store();
        let tree = s.write_tree(&[]).unwrap();
        let commit = s.write_commit(&tree, &[], "c", false).unwrap();
        let tag_id = s.write_tag(&commit, "v1.0.0", "release", false).unwrap();
        let tag = s.read_tag(&tag_id).unwrap();
        assert_eq!(tag.target, commit);
        assert_eq!(tag.name, "v1.0.0");
    }
}
