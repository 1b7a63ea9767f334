use std::sync::Arc;

use refseal_rsl::{RslReader, RslWriter};
use refseal_store::{EntryMode, ObjectStore, StoreError, TreeEntry};
use refseal_types::{names, Hash};
use tracing::debug;

use crate::error::PolicyError;
use crate::ruleset::RuleSet;

/// Name of the rule-set blob inside a policy commit's tree.
const RULESET_FILE: &str = "ruleset.json";

/// Stores rule-sets on the policy references and resolves them at points of
/// the ledger.
///
/// A staged rule-set lives on `refs/gittuf/policy-staging` and is invisible
/// to verification. Applying promotes the staging tip onto
/// `refs/gittuf/policy` and records that advancement as a standard ledger
/// entry, which is the only way the active policy moves.
pub struct PolicyStore {
    store: Arc<dyn ObjectStore>,
}

impl PolicyStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Stage a rule-set for review. Returns the new staging commit id.
    pub fn stage(&self, ruleset: &RuleSet, sign: bool) -> Result<Hash, PolicyError> {
        let bytes = ruleset
            .to_json()
            .map_err(|e| PolicyError::Malformed(e.to_string()))?;
        let blob = self.store.write_blob(&bytes)?;
        let tree = self
            .store
            .write_tree(&[TreeEntry::new(EntryMode::Regular, RULESET_FILE, blob)])?;

        let old_tip = self.read_ref_or_zero(names::POLICY_STAGING_REF)?;
        let parents: Vec<Hash> = if old_tip.is_zero() {
            Vec::new()
        } else {
            vec![old_tip.clone()]
        };
        let commit = self.store.write_commit(
            &tree,
            &parents,
            &format!("Stage policy version {}", ruleset.version),
            sign,
        )?;
        self.store
            .create_or_update_ref(names::POLICY_STAGING_REF, &commit, &old_tip)?;
        debug!(version = ruleset.version, commit = %commit, "policy staged");
        Ok(commit)
    }

    /// Promote the staged rule-set onto the active policy reference and
    /// record the advancement in the ledger. Returns the new ledger entry id.
    pub fn apply(&self, writer: &RslWriter, sign: bool) -> Result<Hash, PolicyError> {
        let staged = match self.store.read_ref(names::POLICY_STAGING_REF) {
            Ok(tip) if !tip.is_zero() => tip,
            Ok(_) | Err(StoreError::NotFound) => return Err(PolicyError::NothingStaged),
            Err(err) => return Err(err.into()),
        };

        let old_tip = self.read_ref_or_zero(names::POLICY_REF)?;
        self.store
            .create_or_update_ref(names::POLICY_REF, &staged, &old_tip)?;

        let entry = writer.record(names::POLICY_REF, &staged, sign)?;
        debug!(policy = %staged, entry = %entry, "policy applied");
        Ok(entry)
    }

    /// The rule-set governing the ledger at `anchor` (exclusive of the
    /// anchor entry itself when it is non-zero): the nearest prior standard
    /// entry for the policy reference that is not revoked by a skip
    /// annotation.
    pub fn ruleset_at(&self, reader: &RslReader, anchor: &Hash) -> Result<RuleSet, PolicyError> {
        let mut anchor = anchor.clone();
        loop {
            let (entry, annotations) =
                match reader.latest_entry_for_ref_before(names::POLICY_REF, &anchor) {
                    Ok(found) => found,
                    Err(refseal_rsl::RslError::NotFound) => return Err(PolicyError::Unresolvable),
                    Err(err) => return Err(err.into()),
                };

            if annotations.iter().any(|a| a.skip) {
                // A revoked policy must not authorize anything; keep looking
                // for the previous live one.
                anchor = entry.id;
                continue;
            }

            return self.load_ruleset(&entry.target_id);
        }
    }

    /// The currently active rule-set, straight from the policy ref tip.
    pub fn current_ruleset(&self) -> Result<RuleSet, PolicyError> {
        let tip = match self.store.read_ref(names::POLICY_REF) {
            Ok(tip) if !tip.is_zero() => tip,
            Ok(_) | Err(StoreError::NotFound) => return Err(PolicyError::Unresolvable),
            Err(err) => return Err(err.into()),
        };
        self.load_ruleset(&tip)
    }

    /// Load the rule-set carried by a policy commit (a `target_id` recorded
    /// for the policy reference).
    pub fn ruleset_from_commit(&self, policy_commit: &Hash) -> Result<RuleSet, PolicyError> {
        self.load_ruleset(policy_commit)
    }

    fn load_ruleset(&self, policy_commit: &Hash) -> Result<RuleSet, PolicyError> {
        let commit = self.store.read_commit(policy_commit)?;
        let tree = self.store.read_tree(&commit.tree)?;
        let entry = tree
            .entry(RULESET_FILE)
            .ok_or_else(|| PolicyError::Malformed(format!("no {RULESET_FILE} in policy tree")))?;
        let bytes = self.store.read_blob(&entry.id)?;
        RuleSet::from_json(&bytes).map_err(|e| PolicyError::Malformed(e.to_string()))
    }

    fn read_ref_or_zero(&self, name: &str) -> Result<Hash, PolicyError> {
        match self.store.read_ref(name) {
            Ok(tip) => Ok(tip),
            Err(StoreError::NotFound) => Ok(self.store.hash_algorithm().zero()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use refseal_store::InMemoryObjectStore;
    use refseal_types::{HashAlgorithm, KeyType, Principal};

    use super::*;
    use crate::ruleset::Rule;

    struct Fixture {
        store: Arc<InMemoryObjectStore>,
        writer: RslWriter,
        reader: RslReader,
        policy: PolicyStore,
    }

    fn setup() -> Fixture {
        let store = Arc::new(InMemoryObjectStore::new());
        let writer = RslWriter::new(store.clone());
        let reader = RslReader::new(store.clone());
        let policy = PolicyStore::new(store.clone());
        writer.initialize().unwrap();
        Fixture {
            store,
            writer,
            reader,
            policy,
        }
    }

    fn ruleset(version: u64) -> RuleSet {
        RuleSet::new(version)
            .with_principal(
                "alice",
                Principal::from_key(KeyType::Ssh, "ssh-ed25519", "aa"),
            )
            .with_rule(Rule {
                name: "protect-main".into(),
                patterns: vec!["refs/heads/main".into()],
                principal_ids: vec!["alice".into()],
                threshold: 1,
            })
    }

    fn target(n: u8) -> Hash {
        HashAlgorithm::Sha1.digest(&[n])
    }

    #[test]
    fn stage_does_not_touch_ledger_or_policy() {
        let f = setup();
        f.policy.stage(&ruleset(1), false).unwrap();

        assert!(f
            .store
            .read_ref(names::POLICY_STAGING_REF)
            .is_ok());
        assert!(f.store.read_ref(names::POLICY_REF).is_err());
        assert!(f.reader.latest_entry().is_err());
    }

    #[test]
    fn apply_without_staging_fails() {
        let f = setup();
        let err = f.policy.apply(&f.writer, false).unwrap_err();
        assert_eq!(err, PolicyError::NothingStaged);
    }

    #[test]
    fn apply_promotes_and_records_ledger_entry() {
        let f = setup();
        f.policy.stage(&ruleset(1), false).unwrap();
        let entry_id = f.policy.apply(&f.writer, false).unwrap();

        let staged = f.store.read_ref(names::POLICY_STAGING_REF).unwrap();
        assert_eq!(f.store.read_ref(names::POLICY_REF).unwrap(), staged);

        let entry = f.reader.latest_entry().unwrap();
        assert_eq!(entry.id(), &entry_id);
        let standard = entry.as_standard().unwrap();
        assert_eq!(standard.ref_name, names::POLICY_REF);
        assert_eq!(standard.target_id, staged);
    }

    #[test]
    fn current_ruleset_reads_policy_tip() {
        let f = setup();
        f.policy.stage(&ruleset(3), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();

        let rs = f.policy.current_ruleset().unwrap();
        assert_eq!(rs.version, 3);
    }

    #[test]
    fn current_ruleset_without_policy_is_unresolvable() {
        let f = setup();
        assert_eq!(
            f.policy.current_ruleset().unwrap_err(),
            PolicyError::Unresolvable
        );
    }

    #[test]
    fn ruleset_at_resolves_nearest_prior_policy() {
        let f = setup();
        f.policy.stage(&ruleset(1), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();
        let e1 = f.writer.record("refs/heads/main", &target(1), false).unwrap();

        f.policy.stage(&ruleset(2), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();
        let e2 = f.writer.record("refs/heads/main", &target(2), false).unwrap();

        // e1 was recorded under version 1, e2 under version 2.
        assert_eq!(f.policy.ruleset_at(&f.reader, &e1).unwrap().version, 1);
        assert_eq!(f.policy.ruleset_at(&f.reader, &e2).unwrap().version, 2);

        // The zero anchor resolves from the tip.
        let zero = f.store.hash_algorithm().zero();
        assert_eq!(f.policy.ruleset_at(&f.reader, &zero).unwrap().version, 2);
    }

    #[test]
    fn ruleset_at_before_any_policy_is_unresolvable() {
        let f = setup();
        // A user entry sneaks in before any policy exists.
        let e1 = f.writer.record("refs/heads/main", &target(1), false).unwrap();
        f.policy.stage(&ruleset(1), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();

        assert_eq!(
            f.policy.ruleset_at(&f.reader, &e1).unwrap_err(),
            PolicyError::Unresolvable
        );
    }

    #[test]
    fn revoked_policy_entry_is_stepped_over() {
        let f = setup();
        f.policy.stage(&ruleset(1), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();

        f.policy.stage(&ruleset(2), false).unwrap();
        let bad_policy_entry = f.policy.apply(&f.writer, false).unwrap();
        f.writer
            .annotate(&[bad_policy_entry], true, "compromised", false)
            .unwrap();

        let e1 = f.writer.record("refs/heads/main", &target(1), false).unwrap();

        // Version 2 is revoked; resolution falls back to version 1.
        assert_eq!(f.policy.ruleset_at(&f.reader, &e1).unwrap().version, 1);
    }

    #[test]
    fn staged_updates_replace_each_other() {
        let f = setup();
        f.policy.stage(&ruleset(1), false).unwrap();
        f.policy.stage(&ruleset(2), false).unwrap();
        f.policy.apply(&f.writer, false).unwrap();

        assert_eq!(f.policy.current_ruleset().unwrap().version, 2);
    }
}
