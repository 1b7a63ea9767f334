//! Ledger entry model.

use refseal_types::{names, Hash};

/// Records that a named reference should now point at a target object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardEntry {
    /// Commit hash of this entry, assigned on write.
    pub id: Hash,
    /// The reference being recorded.
    pub ref_name: String,
    /// Object hash asserted as the new tip of `ref_name`.
    pub target_id: Hash,
}

impl StandardEntry {
    /// True iff this entry records a reference inside the reserved ledger
    /// namespace.
    pub fn is_internal(&self) -> bool {
        names::is_internal_ref(&self.ref_name)
    }
}

/// Metadata attached to one or more prior standard entries.
///
/// With `skip` set, the targeted entries are revoked: every downstream
/// algorithm must treat them as absent from chain coverage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Commit hash of this annotation, assigned on write.
    pub id: Hash,
    /// Prior standard-entry commit hashes this annotation applies to.
    /// Non-empty, in the order given at write time.
    pub targets: Vec<Hash>,
    /// Revocation flag.
    pub skip: bool,
    /// Free-form text, carried byte-for-byte through the armor block.
    pub message: String,
}

impl Annotation {
    /// True iff `entry_id` is among this annotation's targets.
    pub fn refers_to(&self, entry_id: &Hash) -> bool {
        self.targets.contains(entry_id)
    }
}

/// A decoded ledger entry. Walks dispatch on the variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Standard(StandardEntry),
    Annotation(Annotation),
}

impl Entry {
    /// Commit hash of the underlying ledger commit.
    pub fn id(&self) -> &Hash {
        match self {
            Self::Standard(e) => &e.id,
            Self::Annotation(a) => &a.id,
        }
    }

    pub fn as_standard(&self) -> Option<&StandardEntry> {
        match self {
            Self::Standard(e) => Some(e),
            Self::Annotation(_) => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Self::Annotation(a) => Some(a),
            Self::Standard(_) => None,
        }
    }
}
