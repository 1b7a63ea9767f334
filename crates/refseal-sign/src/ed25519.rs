//! Ed25519 signer and verifier (SSH `ssh-ed25519` scheme).

use ed25519_dalek::{Signer, Verifier};
use refseal_types::{KeyMaterial, KeyType, Principal};

use crate::error::SignError;
use crate::traits::{CommitSigner, SignatureVerifier};

pub const ED25519_SCHEME: &str = "ssh-ed25519";

/// Ed25519 signing key.
pub struct Ed25519Signer(ed25519_dalek::SigningKey);

impl Ed25519Signer {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.0.verifying_key().to_bytes()
    }
}

impl CommitSigner for Ed25519Signer {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignError> {
        Ok(self.0.sign(payload).to_bytes().to_vec())
    }

    fn principal(&self) -> Principal {
        Principal::from_key(
            KeyType::Ssh,
            ED25519_SCHEME,
            hex::encode(self.public_key_bytes()),
        )
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signer(<redacted>)")
    }
}

/// Verifies ed25519 signatures straight from the principal's key material.
///
/// Other key types have no backend here and report
/// [`SignError::UnsupportedKeyType`].
#[derive(Debug, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        principal: &Principal,
        payload: &[u8],
        signature: &[u8],
    ) -> Result<(), SignError> {
        match principal.key_type {
            KeyType::Ssh => {}
            other => return Err(SignError::UnsupportedKeyType(other)),
        }
        if principal.scheme != ED25519_SCHEME {
            return Err(SignError::UnsupportedScheme(principal.scheme.clone()));
        }

        let key_hex = match &principal.material {
            KeyMaterial::PublicKey(key) => key,
            KeyMaterial::Keyless { .. } => {
                return Err(SignError::InvalidKey(
                    "ssh principal carries keyless material".to_string(),
                ))
            }
        };

        let key_bytes: [u8; 32] = hex::decode(key_hex)
            .map_err(|e| SignError::InvalidKey(e.to_string()))?
            .try_into()
            .map_err(|_| SignError::InvalidKey("expected 32-byte public key".to_string()))?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| SignError::InvalidKey(e.to_string()))?;

        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| SignError::InvalidSignature)?;
        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);

        key.verify(payload, &sig)
            .map_err(|_| SignError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let signer = Ed25519Signer::generate();
        let sig = signer.sign(b"hello world").unwrap();
        Ed25519Verifier::new()
            .verify(&signer.principal(), b"hello world", &sig)
            .unwrap();
    }

    #[test]
    fn verify_fails_on_wrong_payload() {
        let signer = Ed25519Signer::generate();
        let sig = signer.sign(b"correct payload").unwrap();
        let err = Ed25519Verifier::new()
            .verify(&signer.principal(), b"wrong payload", &sig)
            .unwrap_err();
        assert_eq!(err, SignError::InvalidSignature);
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let signer = Ed25519Signer::generate();
        let other = Ed25519Signer::generate();
        let sig = signer.sign(b"payload").unwrap();
        let err = Ed25519Verifier::new()
            .verify(&other.principal(), b"payload", &sig)
            .unwrap_err();
        assert_eq!(err, SignError::InvalidSignature);
    }

    #[test]
    fn deterministic_from_bytes() {
        let a = Ed25519Signer::from_bytes([7u8; 32]);
        let b = Ed25519Signer::from_bytes([7u8; 32]);
        assert_eq!(a.principal(), b.principal());
    }

    #[test]
    fn unsupported_key_type_reported() {
        let signer = Ed25519Signer::generate();
        let sig = signer.sign(b"payload").unwrap();
        let keyless = Principal::keyless("dev@example.com", "https://accounts.example.com");
        let err = Ed25519Verifier::new()
            .verify(&keyless, b"payload", &sig)
            .unwrap_err();
        assert_eq!(err, SignError::UnsupportedKeyType(KeyType::Sigstore));
    }

    #[test]
    fn unsupported_scheme_reported() {
        let signer = Ed25519Signer::generate();
        let sig = signer.sign(b"payload").unwrap();
        let rsa = Principal::from_key(KeyType::Ssh, "rsa-pss-sha256", "aabbcc");
        let err = Ed25519Verifier::new()
            .verify(&rsa, b"payload", &sig)
            .unwrap_err();
        assert!(matches!(err, SignError::UnsupportedScheme(_)));
    }

    #[test]
    fn debug_redacts_signing_key() {
        let signer = Ed25519Signer::generate();
        assert!(format!("{signer:?}").contains("redacted"));
    }

    #[test]
    fn truncated_signature_rejected() {
        let signer = Ed25519Signer::generate();
        let err = Ed25519Verifier::new()
            .verify(&signer.principal(), b"payload", &[0u8; 12])
            .unwrap_err();
        assert_eq!(err, SignError::InvalidSignature);
    }
}
