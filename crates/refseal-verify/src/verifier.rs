use std::sync::Arc;

use refseal_policy::{PolicyError, PolicyStore, RuleSet};
use refseal_rsl::{RslError, RslReader};
use refseal_sign::SignatureVerifier;
use refseal_store::{CommitObject, ObjectStore, StoreError};
use refseal_types::{names, Hash, Principal};
use tracing::debug;

use crate::error::VerifyError;

/// Successful verification summary for one reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefVerification {
    pub ref_name: String,
    /// The latest non-revoked recorded target, which the repository's live
    /// tip matches.
    pub verified_tip: Hash,
    pub entries_checked: usize,
    pub entries_skipped: usize,
    /// Approval threshold the policy in force assigns to this reference.
    /// A ledger commit carries one signature; thresholds above one are
    /// completed by out-of-band attestations.
    pub threshold: usize,
}

/// Answers "is the current tip of reference R authorized up to and including
/// the ledger tip?".
pub struct Verifier {
    store: Arc<dyn ObjectStore>,
    reader: RslReader,
    policy: PolicyStore,
    signatures: Arc<dyn SignatureVerifier>,
}

impl Verifier {
    pub fn new(store: Arc<dyn ObjectStore>, signatures: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            reader: RslReader::new(store.clone()),
            policy: PolicyStore::new(store.clone()),
            store,
            signatures,
        }
    }

    /// Verify every ledger entry for `ref_name` from genesis to the ledger
    /// tip, then compare the repository's live tip against the latest
    /// non-revoked recorded target.
    pub fn verify_ref(&self, ref_name: &str) -> Result<RefVerification, VerifyError> {
        let (genesis, _) = self.reader.first_entry()?;
        let latest = self.reader.latest_entry()?;
        let (entries, annotations) =
            self.reader
                .entries_in_range_for_ref(&genesis.id, latest.id(), ref_name)?;

        // Policy state advances as the walk crosses entries for the policy
        // reference; each entry for `ref_name` is judged by the state in
        // force strictly before it.
        let mut ruleset: Option<RuleSet> = None;
        let mut prev_target: Option<Hash> = None;
        let mut seen = 0usize;
        let mut checked = 0usize;
        let mut skipped = 0usize;
        let mut threshold = 1usize;

        for entry in &entries {
            let revoked = annotations
                .get(&entry.id)
                .is_some_and(|list| list.iter().any(|a| a.skip));

            if entry.ref_name == ref_name {
                seen += 1;
                if revoked {
                    skipped += 1;
                } else {
                    let in_force = self.ruleset_for_entry(
                        ref_name,
                        entry.id.clone(),
                        &entry.target_id,
                        &ruleset,
                    )?;

                    let commit = self.store.read_commit(&entry.id)?;
                    let authorized = in_force.principals_authorized_for(ref_name);
                    if !signature_authorized(self.signatures.as_ref(), &commit, &authorized) {
                        return Err(VerifyError::UnauthorizedSignature {
                            ref_name: ref_name.to_string(),
                            entry: entry.id.clone(),
                        });
                    }

                    if let Some(prev) = &prev_target {
                        if !self.store.knows_commit(prev, &entry.target_id)? {
                            return Err(VerifyError::ChainDivergence {
                                ref_name: ref_name.to_string(),
                                expected: prev.clone(),
                                actual: entry.target_id.clone(),
                            });
                        }
                    }

                    threshold = in_force.threshold_for(ref_name).unwrap_or(1);
                    prev_target = Some(entry.target_id.clone());
                    checked += 1;
                    debug!(entry = %entry.id, target = %entry.target_id, "entry verified");
                }
            }

            // Crossing a live policy entry replaces the state for everything
            // after it.
            if entry.ref_name == names::POLICY_REF && !revoked {
                ruleset = Some(self.load_policy(&entry.id, &entry.target_id)?);
            }
        }

        if seen == 0 {
            return Err(VerifyError::Ledger(RslError::NotFound));
        }
        let Some(expected) = prev_target else {
            return Err(VerifyError::Revoked {
                ref_name: ref_name.to_string(),
            });
        };

        let actual = match self.store.read_ref(ref_name) {
            Ok(tip) => tip,
            Err(StoreError::NotFound) => self.store.hash_algorithm().zero(),
            Err(err) => return Err(err.into()),
        };
        if actual != expected {
            return Err(VerifyError::ChainDivergence {
                ref_name: ref_name.to_string(),
                expected,
                actual,
            });
        }

        Ok(RefVerification {
            ref_name: ref_name.to_string(),
            verified_tip: expected,
            entries_checked: checked,
            entries_skipped: skipped,
            threshold,
        })
    }

    /// The rule-set judging one entry. The genesis policy entry has nothing
    /// before it; it is the root of trust and must at least satisfy the
    /// rule-set it introduces.
    fn ruleset_for_entry(
        &self,
        ref_name: &str,
        entry: Hash,
        target: &Hash,
        state: &Option<RuleSet>,
    ) -> Result<RuleSet, VerifyError> {
        if let Some(ruleset) = state {
            return Ok(ruleset.clone());
        }
        if ref_name == names::POLICY_REF {
            return self.load_policy(&entry, target);
        }
        Err(VerifyError::PolicyUnresolvable { entry })
    }

    fn load_policy(&self, entry: &Hash, target: &Hash) -> Result<RuleSet, VerifyError> {
        self.policy
            .ruleset_from_commit(target)
            .map_err(|err| match err {
                PolicyError::Ledger(inner) => VerifyError::Ledger(inner),
                PolicyError::Store(inner) => VerifyError::Store(inner),
                other => VerifyError::MalformedPolicy {
                    entry: entry.clone(),
                    reason: other.to_string(),
                },
            })
    }
}

/// True iff the commit carries a signature that verifies against one of the
/// authorized principals. Backend misses (unsupported key types) count as
/// non-matches, not errors: another principal may still verify.
fn signature_authorized(
    verifier: &dyn SignatureVerifier,
    commit: &CommitObject,
    authorized: &[Principal],
) -> bool {
    let Some(signature) = &commit.signature else {
        return false;
    };
    let payload = commit.payload_bytes();
    authorized
        .iter()
        .any(|principal| verifier.verify(principal, &payload, signature).is_ok())
}
