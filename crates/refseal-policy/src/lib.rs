//! Versioned policy metadata on the ledger's policy references.
//!
//! A [`RuleSet`] names principals and maps reference patterns to the subset
//! of principals authorized to advance matching references. Rule-sets are
//! staged on `refs/gittuf/policy-staging`, promoted onto `refs/gittuf/policy`
//! by [`PolicyStore::apply`], which records the advancement in the reference
//! state log so that policy history is itself tamper-evident, and resolved
//! at any moment of the log with [`PolicyStore::ruleset_at`].
//!
//! Delegation resolution beyond ordered first-match (TUF-style delegation
//! graphs) is an external collaborator; this crate only defines what the
//! log walk consumes.

pub mod error;
pub mod ruleset;
pub mod store;

pub use error::PolicyError;
pub use ruleset::{Rule, RuleSet};
pub use store::PolicyStore;
