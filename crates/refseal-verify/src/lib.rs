//! Authorization verification for tracked references.
//!
//! The [`Verifier`] ties the other subsystems together to answer one
//! question: is the current tip of a reference authorized, up to and
//! including the ledger tip? It walks the ledger for the reference, resolves
//! the policy in force at each entry, checks each entry's commit signature
//! against the authorized principals, confirms target ancestry between
//! consecutive entries, honors revocations, and finally compares the
//! repository's live tip against the latest non-revoked recorded target.

pub mod error;
pub mod verifier;

pub use error::VerifyError;
pub use verifier::{RefVerification, Verifier};
