use refseal_rsl::RslError;
use refseal_store::StoreError;
use refseal_types::Hash;

/// The verification answer, when it is not "authorized".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// An entry's commit is unsigned or signed by nobody the policy
    /// authorizes for the reference.
    #[error("entry {entry} is not signed by a principal authorized for {ref_name}")]
    UnauthorizedSignature { ref_name: String, entry: Hash },

    /// No policy can be resolved at an entry that needs one.
    #[error("no policy is resolvable at entry {entry}")]
    PolicyUnresolvable { entry: Hash },

    /// Recorded targets do not form an ancestry chain, or the repository's
    /// live tip does not match the latest recorded target.
    #[error("reference {ref_name} diverges from the ledger: expected {expected}, found {actual}")]
    ChainDivergence {
        ref_name: String,
        expected: Hash,
        actual: Hash,
    },

    /// Every entry recording the reference has been revoked.
    #[error("all ledger entries for {ref_name} are revoked")]
    Revoked { ref_name: String },

    /// A policy document in force is unreadable. Unlike
    /// [`VerifyError::PolicyUnresolvable`] this is corruption, not absence.
    #[error("policy in force at entry {entry} is malformed: {reason}")]
    MalformedPolicy { entry: Hash, reason: String },

    #[error(transparent)]
    Ledger(#[from] RslError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
