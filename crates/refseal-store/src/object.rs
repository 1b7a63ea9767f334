//! Value types for stored repository objects.

use refseal_types::Hash;

/// File mode of a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryMode {
    Regular,
    Executable,
    Symlink,
    Tree,
}

impl EntryMode {
    /// Octal mode string as recorded in tree objects.
    pub fn as_octal(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Executable => "100755",
            Self::Symlink => "120000",
            Self::Tree => "40000",
        }
    }
}

/// One named entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub id: Hash,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, id: Hash) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }
}

/// A tree object: ordered named references to blobs and subtrees.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TreeObject {
    pub entries: Vec<TreeEntry>,
}

impl TreeObject {
    /// Canonical serialization: one `mode name id` line per entry, sorted by
    /// name. The id of a tree is the digest of these bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut entries: Vec<&TreeEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut out = Vec::new();
        for entry in entries {
            out.extend_from_slice(entry.mode.as_octal().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.id.as_str().as_bytes());
            out.push(b'\n');
        }
        out
    }

    /// Find an entry by name.
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// A commit object.
///
/// Ledger commits always carry the empty tree and at most one parent; user
/// commits reachable from recorded targets may have any shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitObject {
    pub tree: Hash,
    pub parents: Vec<Hash>,
    pub author: String,
    pub timestamp: u64,
    pub message: String,
    /// Detached signature over [`CommitObject::payload_bytes`], if signed.
    pub signature: Option<Vec<u8>>,
}

impl CommitObject {
    /// Canonical serialization of everything except the signature. These are
    /// the bytes a signer signs and a verifier checks.
    pub fn payload_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.as_str().as_bytes());
        out.push(b'\n');
        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.as_str().as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(
            format!("author {} {}\n", self.author, self.timestamp).as_bytes(),
        );
        out.extend_from_slice(
            format!("committer {} {}\n", self.author, self.timestamp).as_bytes(),
        );
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }

    /// Full object serialization, signature included. The commit id is the
    /// digest of these bytes, so a stripped signature changes the id.
    pub fn object_bytes(&self) -> Vec<u8> {
        let mut out = self.payload_bytes();
        if let Some(sig) = &self.signature {
            out.extend_from_slice(b"\nsignature ");
            out.extend_from_slice(hex::encode(sig).as_bytes());
            out.push(b'\n');
        }
        out
    }
}

/// An annotated tag object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagObject {
    pub target: Hash,
    pub name: String,
    pub message: String,
    pub signature: Option<Vec<u8>>,
}

impl TagObject {
    /// Canonical serialization of everything except the signature.
    pub fn payload_bytes(&self) -> Vec<u8> {
        format!(
            "object {}\ntag {}\n\n{}",
            self.target, self.name, self.message
        )
        .into_bytes()
    }

    pub fn object_bytes(&self) -> Vec<u8> {
        let mut out = self.payload_bytes();
        if let Some(sig) = &self.signature {
            out.extend_from_slice(b"\nsignature ");
            out.extend_from_slice(hex::encode(sig).as_bytes());
            out.push(b'\n');
        }
        out
    }
}
