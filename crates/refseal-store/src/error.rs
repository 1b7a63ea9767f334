use refseal_types::Hash;

/// Errors produced by object store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("object or reference not found")]
    NotFound,

    #[error("compare-and-swap failed for {reference}: expected {expected}, found {actual}")]
    CasConflict {
        reference: String,
        expected: Hash,
        actual: Hash,
    },

    #[error("object {0} is not of the requested kind")]
    WrongKind(Hash),

    #[error("ledger commits carry at most one parent, got {0}")]
    TooManyParents(usize),

    #[error("signing requested but no signer is configured")]
    SignerUnavailable,

    #[error("signing failed: {0}")]
    Signing(#[from] refseal_sign::SignError),

    #[error("store backend error: {0}")]
    Backend(String),
}
