//! Signer and signature-verifier capabilities.
//!
//! The ledger core never implements signature envelopes itself; it signs and
//! verifies through the [`CommitSigner`] and [`SignatureVerifier`] traits.
//! This crate ships one concrete implementation of each, backed by ed25519
//! (the SSH `ssh-ed25519` scheme), which is what tests and repository
//! bootstrap use. OpenPGP, other SSH schemes, and Sigstore keyless
//! verification are provided by external backends implementing the same
//! traits.

pub mod ed25519;
pub mod error;
pub mod traits;

pub use ed25519::{Ed25519Signer, Ed25519Verifier};
pub use error::SignError;
pub use traits::{CommitSigner, SignatureVerifier};
