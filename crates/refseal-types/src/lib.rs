//! Foundation types for the refseal reference state log.
//!
//! This crate provides the value types shared by every other refseal crate.
//!
//! # Key Types
//!
//! - [`Hash`] — hex-encoded Git object id (SHA-1 or SHA-256)
//! - [`HashAlgorithm`] — the digest algorithm a repository uses, with its
//!   zero hash and canonical empty-tree id
//! - [`Principal`] — an identity authorized by policy to sign ledger entries
//! - [`names`] — the reserved ledger ref namespace and ref-name validation

pub mod error;
pub mod hash;
pub mod names;
pub mod principal;

pub use error::TypeError;
pub use hash::{Hash, HashAlgorithm};
pub use principal::{KeyMaterial, KeyType, Principal};
