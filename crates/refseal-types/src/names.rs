//! The reserved ledger ref namespace and git-style ref-name validation.
//!
//! Three well-known references live under the reserved prefix: the reference
//! state log itself, the applied policy snapshot, and the staged policy
//! proposal, plus an optional attestations ref. Any reference under the
//! prefix is internal to the ledger and is distinguished from user
//! references during log walks.

use crate::error::TypeError;

/// Prefix of the reserved ledger namespace.
pub const NAMESPACE_PREFIX: &str = "refs/gittuf/";

/// The append-only reference state log chain.
pub const RSL_REF: &str = "refs/gittuf/reference-state-log";

/// Applied, active policy snapshot.
pub const POLICY_REF: &str = "refs/gittuf/policy";

/// Proposed policy under review.
pub const POLICY_STAGING_REF: &str = "refs/gittuf/policy-staging";

/// Out-of-band approval envelopes.
pub const ATTESTATIONS_REF: &str = "refs/gittuf/attestations";

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Returns true if the reference is internal to the ledger namespace.
pub fn is_internal_ref(name: &str) -> bool {
    name.starts_with(NAMESPACE_PREFIX)
}

/// Remote tracking ref for the ledger on the given remote.
///
/// For `origin` this is `refs/remotes/origin/gittuf/reference-state-log`.
pub fn remote_tracker_ref(remote: &str) -> String {
    format!("refs/remotes/{remote}/gittuf/reference-state-log")
}

/// Validate a fully qualified reference name (e.g. `refs/heads/main`).
///
/// Follows git-style naming conventions to prevent ambiguity and filesystem
/// issues.
///
/// # Examples
///
/// ```
/// use refseal_types::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("refs/heads/feature/auth").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidRefName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("reference name must not be empty"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(TypeError::InvalidRefName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid("must not contain '@{'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid("must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid("must not end with '.lock'"));
    }

    if name.contains("//") {
        return Err(invalid("must not contain consecutive slashes '//'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(TypeError::InvalidRefName {
                name: name.to_string(),
                reason: format!("component must not start with '.': {component:?}"),
            });
        }
        if component.ends_with(".lock") {
            return Err(invalid("component must not end with '.lock'"));
        }
    }

    Ok(())
}
