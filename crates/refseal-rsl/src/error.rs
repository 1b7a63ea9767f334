use refseal_store::StoreError;
use refseal_types::{Hash, TypeError};

/// Errors surfaced by ledger reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RslError {
    /// The requested entry, or the ledger itself, does not exist.
    #[error("unable to find ledger entry")]
    NotFound,

    #[error("ledger already initialized")]
    AlreadyInitialized,

    /// Another writer advanced the ledger tip first. Re-read remote state,
    /// re-validate, and retry.
    #[error("ledger tip moved underneath this write")]
    Conflict,

    /// An entry with more than one parent: the chain has been branched
    /// out-of-band and is corrupt.
    #[error("ledger branch detected, entry has more than one parent")]
    Branch,

    #[error("ledger entry has invalid format or is of unexpected type: {reason}")]
    InvalidEntry { reason: String },

    #[error("annotation target {0} is not an entry in the ledger")]
    UnknownTarget(Hash),

    #[error("annotation must refer to at least one entry")]
    EmptyTargets,

    #[error("commit has not been encountered before")]
    NoRecordOfCommit,

    #[error(transparent)]
    InvalidRef(#[from] TypeError),

    #[error(transparent)]
    Store(StoreError),
}

impl RslError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for RslError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::CasConflict { .. } => Self::Conflict,
            other => Self::Store(other),
        }
    }
}
