use refseal_rsl::RslError;
use refseal_store::StoreError;

/// Errors from policy storage and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// No live policy precedes the queried point of the log.
    #[error("no policy is resolvable at the queried ledger entry")]
    Unresolvable,

    #[error("no staged policy to apply")]
    NothingStaged,

    #[error("policy document is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Ledger(#[from] RslError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
