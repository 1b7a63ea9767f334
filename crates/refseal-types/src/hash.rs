use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::Digest;

use crate::error::TypeError;

const SHA1_HEX_LEN: usize = 40;
const SHA256_HEX_LEN: usize = 64;

const ZERO_SHA1: &str = "0000000000000000000000000000000000000000";
const ZERO_SHA256: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// Canonical ids of the empty tree object, per algorithm.
const EMPTY_TREE_SHA1: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
const EMPTY_TREE_SHA256: &str =
    "6ef19b41225c5369f1c104d45d8d85efa9b057b53b14b4b9b939dd74decc5321";

/// Digest algorithm in use by a repository.
///
/// All hashes within one ledger share a single algorithm, determined by the
/// underlying repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Length of a hex-encoded digest for this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => SHA1_HEX_LEN,
            Self::Sha256 => SHA256_HEX_LEN,
        }
    }

    /// The all-zero digest for this algorithm.
    pub fn zero(&self) -> Hash {
        match self {
            Self::Sha1 => Hash(ZERO_SHA1.to_string()),
            Self::Sha256 => Hash(ZERO_SHA256.to_string()),
        }
    }

    /// The canonical id of the empty tree object for this algorithm.
    pub fn empty_tree(&self) -> Hash {
        match self {
            Self::Sha1 => Hash(EMPTY_TREE_SHA1.to_string()),
            Self::Sha256 => Hash(EMPTY_TREE_SHA256.to_string()),
        }
    }

    /// Digest raw bytes into a [`Hash`].
    pub fn digest(&self, data: &[u8]) -> Hash {
        match self {
            Self::Sha1 => {
                let mut hasher = sha1::Sha1::new();
                hasher.update(data);
                Hash(hex::encode(hasher.finalize()))
            }
            Self::Sha256 => {
                let mut hasher = sha2::Sha256::new();
                hasher.update(data);
                Hash(hex::encode(hasher.finalize()))
            }
        }
    }
}

/// Hex-encoded Git object id.
///
/// A `Hash` wraps the lowercase hex representation of a SHA-1 (40 chars) or
/// SHA-256 (64 chars) digest. Construction validates encoding and length, so
/// a held `Hash` is always well formed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash(String);

impl Hash {
    /// Parse and validate a hex digest string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != SHA1_HEX_LEN && s.len() != SHA256_HEX_LEN {
            return Err(TypeError::InvalidLength { actual: s.len() });
        }
        if hex::decode(s).is_err() {
            return Err(TypeError::InvalidHex(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The all-zero digest for the given algorithm.
    pub fn zero(algorithm: HashAlgorithm) -> Self {
        algorithm.zero()
    }

    /// Returns true for the all-zero digest of either length.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_SHA1 || self.0 == ZERO_SHA256
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Hash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Hash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Hash> for String {
    fn from(h: Hash) -> Self {
        h.0
    }
}
