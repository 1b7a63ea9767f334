//! Principal identity: who may sign ledger entries.
//!
//! A principal is identified by a key type, a signing scheme, and key
//! material that is either a raw public key or an `(identity, issuer)` pair
//! for keyless signatures. Equality is by `(identity, issuer)` for keyless
//! principals and by key fingerprint otherwise, so the same key declared
//! with cosmetic differences still compares equal.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Signature mechanism a principal's key belongs to.
///
/// Verification dispatches on this tag; each type is handled by a dedicated
/// backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// OpenPGP keys.
    OpenPgp,
    /// SSH keys (RSA, ECDSA, Ed25519).
    Ssh,
    /// Sigstore/Fulcio keyless identities.
    Sigstore,
}

/// Key material carried by a principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyMaterial {
    /// Hex-encoded raw public key.
    PublicKey(String),
    /// Keyless identity bound to an OIDC issuer.
    Keyless { identity: String, issuer: String },
}

/// An identity authorized by policy to advance references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub key_type: KeyType,
    /// Signing scheme, e.g. `ssh-ed25519` or `rsa-pss-sha256`.
    pub scheme: String,
    pub material: KeyMaterial,
}

impl Principal {
    /// A key-carrying principal.
    pub fn from_key(key_type: KeyType, scheme: impl Into<String>, public_key_hex: impl Into<String>) -> Self {
        Self {
            key_type,
            scheme: scheme.into(),
            material: KeyMaterial::PublicKey(public_key_hex.into()),
        }
    }

    /// A Sigstore keyless principal.
    pub fn keyless(identity: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            key_type: KeyType::Sigstore,
            scheme: "fulcio".to_string(),
            material: KeyMaterial::Keyless {
                identity: identity.into(),
                issuer: issuer.into(),
            },
        }
    }

    /// SHA-256 fingerprint of the raw public key, or `None` for keyless
    /// principals.
    pub fn fingerprint(&self) -> Option<String> {
        match &self.material {
            KeyMaterial::PublicKey(key) => {
                let mut hasher = Sha256::new();
                hasher.update(self.scheme.as_bytes());
                hasher.update(b":");
                hasher.update(key.as_bytes());
                Some(hex::encode(hasher.finalize()))
            }
            KeyMaterial::Keyless { .. } => None,
        }
    }

    // Canonical comparison key: (identity, issuer) for keyless, key
    // fingerprint otherwise.
    fn identity_key(&self) -> String {
        match &self.material {
            KeyMaterial::Keyless { identity, issuer } => format!("keyless:{issuer}:{identity}"),
            KeyMaterial::PublicKey(_) => {
                // fingerprint() is Some for key material
                format!("key:{}", self.fingerprint().unwrap_or_default())
            }
        }
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for Principal {}

impl std::hash::Hash for Principal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

impl PartialOrd for Principal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Principal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity_key().cmp(&other.identity_key())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.material {
            KeyMaterial::Keyless { identity, issuer } => {
                write!(f, "{identity} ({issuer})")
            }
            KeyMaterial::PublicKey(_) => {
                let fp = self.fingerprint().unwrap_or_default();
                write!(f, "{}:{}", self.scheme, &fp[..16.min(fp.len())])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_principal(key: &str) -> Principal {
        Principal::from_key(KeyType::Ssh, "ssh-ed25519", key)
    }

    #[test]
    fn same_key_compares_equal() {
        assert_eq!(key_principal("aabbcc"), key_principal("aabbcc"));
    }

    #[test]
    fn different_keys_differ() {
        assert_ne!(key_principal("aabbcc"), key_principal("ddeeff"));
    }

    #[test]
    fn scheme_is_part_of_fingerprint() {
        let a = Principal::from_key(KeyType::Ssh, "ssh-ed25519", "aabbcc");
        let b = Principal::from_key(KeyType::Ssh, "ecdsa-sha2-nistp256", "aabbcc");
        assert_ne!(a, b);
    }

    #[test]
    fn keyless_equality_is_identity_and_issuer() {
        let a = Principal::keyless("dev@example.com", "https://accounts.example.com");
        let b = Principal::keyless("dev@example.com", "https://accounts.example.com");
        let c = Principal::keyless("dev@example.com", "https://other-issuer.example");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn keyless_has_no_fingerprint() {
        let p = Principal::keyless("dev@example.com", "https://accounts.example.com");
        assert!(p.fingerprint().is_none());
    }

    #[test]
    fn key_principal_has_fingerprint() {
        let fp = key_principal("aabbcc").fingerprint().unwrap();
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn ordering_groups_by_identity() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(key_principal("aabbcc"));
        set.insert(key_principal("aabbcc"));
        set.insert(key_principal("ddeeff"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let p = key_principal("aabbcc");
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, parsed);

        let k = Principal::keyless("dev@example.com", "https://accounts.example.com");
        let json = serde_json::to_string(&k).unwrap();
        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(k, parsed);
    }
}
