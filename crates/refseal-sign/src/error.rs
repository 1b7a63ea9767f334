use refseal_types::KeyType;

/// Errors from signing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error("signature does not verify")]
    InvalidSignature,

    #[error("malformed key material: {0}")]
    InvalidKey(String),

    #[error("no backend available for key type {0:?}")]
    UnsupportedKeyType(KeyType),

    #[error("unsupported signing scheme {0:?}")]
    UnsupportedScheme(String),
}
