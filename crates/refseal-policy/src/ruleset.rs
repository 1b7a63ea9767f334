use std::collections::BTreeMap;

use refseal_types::Principal;
use serde::{Deserialize, Serialize};

/// One delegation: references matching any of `patterns` may be advanced by
/// `threshold` of the named principals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Human-readable rule name.
    pub name: String,
    /// Reference patterns, exact or with `*` wildcards
    /// (e.g. `refs/heads/*`).
    pub patterns: Vec<String>,
    /// Keys into [`RuleSet::principals`].
    pub principal_ids: Vec<String>,
    /// How many of the named principals must approve an advancement.
    pub threshold: usize,
}

/// A versioned policy document.
///
/// Rules are ordered; the first rule with a matching pattern decides a
/// reference. A reference no rule matches is unauthorized for everyone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: u64,
    /// RFC 3339 expiry, checked by external tooling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// All principals the document mentions, keyed by a caller-chosen id.
    pub principals: BTreeMap<String, Principal>,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            expires: None,
            principals: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    /// Register a principal under `id` and return `self` for chaining.
    pub fn with_principal(mut self, id: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(id.into(), principal);
        self
    }

    /// Append a rule and return `self` for chaining.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The first rule whose patterns match `ref_name`.
    pub fn rule_for(&self, ref_name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| pattern_matches(p, ref_name)))
    }

    /// Principals authorized to advance `ref_name`, in rule order. Empty if
    /// no rule matches.
    pub fn principals_authorized_for(&self, ref_name: &str) -> Vec<Principal> {
        let Some(rule) = self.rule_for(ref_name) else {
            return Vec::new();
        };
        rule.principal_ids
            .iter()
            .filter_map(|id| self.principals.get(id).cloned())
            .collect()
    }

    /// The approval threshold for `ref_name`, if any rule matches.
    pub fn threshold_for(&self, ref_name: &str) -> Option<usize> {
        self.rule_for(ref_name).map(|rule| rule.threshold)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Match a reference name against a pattern. `*` matches any run of
/// characters, including `/`; everything else is literal.
fn pattern_matches(pattern: &str, name: &str) -> bool {
    fn matches(p: &[u8], n: &[u8]) -> bool {
        match (p.first(), n.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                matches(&p[1..], n) || (!n.is_empty() && matches(p, &n[1..]))
            }
            (Some(pc), Some(nc)) if pc == nc => matches(&p[1..], &n[1..]),
            _ => false,
        }
    }
    matches(pattern.as_bytes(), name.as_bytes())
}
