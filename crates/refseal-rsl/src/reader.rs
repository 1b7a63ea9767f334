//! Log walks: the query side of the ledger.
//!
//! All queries are pure functions over the chain; nothing is cached between
//! calls because the ledger can advance between them. Walks follow parent
//! edges from the tip, terminate at genesis, fail on a branched chain, and
//! abort on the first malformed body.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use refseal_store::ObjectStore;
use refseal_types::{names, Hash};
use tracing::warn;

use crate::codec;
use crate::entry::{Annotation, Entry, StandardEntry};
use crate::error::RslError;

/// Read-only queries over the ledger.
pub struct RslReader {
    store: Arc<dyn ObjectStore>,
}

impl RslReader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Decode the entry at `id`.
    pub fn entry(&self, id: &Hash) -> Result<Entry, RslError> {
        let commit = self.store.read_commit(id)?;
        codec::decode(id, &commit.message)
    }

    /// The parent entry of `entry`, or `NotFound` for genesis. An entry with
    /// more than one parent fails with `Branch`.
    pub fn parent_of(&self, entry: &Entry) -> Result<Entry, RslError> {
        let commit = self.store.read_commit(entry.id())?;
        match commit.parents.len() {
            0 => Err(RslError::NotFound),
            1 => self.entry(&commit.parents[0]),
            _ => Err(RslError::Branch),
        }
    }

    /// The entry at the ledger tip. `NotFound` when the ledger is empty or
    /// uninitialized.
    pub fn latest_entry(&self) -> Result<Entry, RslError> {
        let tip = self.store.read_ref(names::RSL_REF)?;
        if tip.is_zero() {
            return Err(RslError::NotFound);
        }
        self.entry(&tip)
    }

    /// The latest standard entry for a reference outside the reserved
    /// namespace, with its annotations (oldest first).
    pub fn latest_user_entry(&self) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let start = self.latest_entry()?;
        self.find_backwards(start, |entry| !entry.is_internal())
    }

    /// The first non-internal standard entry strictly before `entry`, with
    /// its annotations.
    pub fn user_parent_of(
        &self,
        entry: &Entry,
    ) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let start = self.parent_of(entry)?;
        self.find_backwards(start, |e| !e.is_internal())
    }

    /// The latest standard entry for `ref_name`, with its annotations.
    pub fn latest_entry_for_ref(
        &self,
        ref_name: &str,
    ) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let start = self.latest_entry()?;
        self.find_backwards(start, |entry| entry.ref_name == ref_name)
    }

    /// The latest standard entry for `ref_name` strictly before the entry
    /// `anchor`. A zero anchor behaves like [`Self::latest_entry_for_ref`].
    pub fn latest_entry_for_ref_before(
        &self,
        ref_name: &str,
        anchor: &Hash,
    ) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let start = if anchor.is_zero() {
            self.latest_entry()?
        } else {
            let anchored = self.entry(anchor)?;
            self.parent_of(&anchored)?
        };
        self.find_backwards(start, |entry| entry.ref_name == ref_name)
    }

    /// The genesis entry, with its annotations. Genesis must be a standard
    /// entry; an annotation there means the ledger is corrupt.
    pub fn first_entry(&self) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let mut annotations = Vec::new();
        let mut standard_ids = HashSet::new();
        let mut cursor = self.latest_entry()?;

        loop {
            match &cursor {
                Entry::Standard(e) => {
                    standard_ids.insert(e.id.clone());
                }
                Entry::Annotation(a) => annotations.push(a.clone()),
            }

            match self.parent_of(&cursor) {
                Ok(parent) => cursor = parent,
                Err(RslError::NotFound) => break,
                Err(err) => return Err(err),
            }
        }

        let first = match cursor {
            Entry::Standard(e) => e,
            Entry::Annotation(_) => {
                return Err(RslError::invalid("genesis entry is an annotation"))
            }
        };

        // This is the only walk that sees the whole chain, so it can tell a
        // normal "target is later in the log" miss from a target that never
        // existed. Foreign writers may produce such annotations; keep
        // aggregation permissive but say something.
        for annotation in &annotations {
            for target in &annotation.targets {
                if !standard_ids.contains(target) {
                    warn!(
                        annotation = %annotation.id,
                        target = %target,
                        "annotation targets an id that never appears in the ledger"
                    );
                }
            }
        }

        let annotations = filter_annotations(annotations, &first.id);
        Ok((first, annotations))
    }

    /// The first entry recording `commit` or a descendant of it: the moment
    /// the commit became visible in the repository, irrespective of ref.
    pub fn first_entry_for_commit(
        &self,
        commit: &Hash,
    ) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        // Entries are checked in pairs, walking backwards through user
        // entries. The first pair whose older member does not know the
        // commit ends the walk; the younger member is the answer.
        let (mut entry, mut annotations) = match self.latest_user_entry() {
            Ok(found) => found,
            Err(RslError::NotFound) => return Err(RslError::NoRecordOfCommit),
            Err(err) => return Err(err),
        };

        if !self.store.knows_commit(commit, &entry.target_id)? {
            return Err(RslError::NoRecordOfCommit);
        }

        loop {
            let (older, older_annotations) =
                match self.user_parent_of(&Entry::Standard(entry.clone())) {
                    Ok(found) => found,
                    Err(RslError::NotFound) => return Ok((entry, annotations)),
                    Err(err) => return Err(err),
                };

            if !self.store.knows_commit(commit, &older.target_id)? {
                return Ok((entry, annotations));
            }

            entry = older;
            annotations = older_annotations;
        }
    }

    /// Standard entries between `first_id` and `last_id` inclusive, in
    /// chronological order, plus the annotations that refer to each.
    pub fn entries_in_range(
        &self,
        first_id: &Hash,
        last_id: &Hash,
    ) -> Result<(Vec<StandardEntry>, BTreeMap<Hash, Vec<Annotation>>), RslError> {
        self.entries_in_range_filtered(first_id, last_id, None)
    }

    /// Like [`Self::entries_in_range`], restricted to entries for `ref_name`
    /// and entries for internal references (which interleave with every
    /// user ref's history and are needed to resolve policy at a point in
    /// the log).
    pub fn entries_in_range_for_ref(
        &self,
        first_id: &Hash,
        last_id: &Hash,
        ref_name: &str,
    ) -> Result<(Vec<StandardEntry>, BTreeMap<Hash, Vec<Annotation>>), RslError> {
        self.entries_in_range_filtered(first_id, last_id, Some(ref_name))
    }

    fn entries_in_range_filtered(
        &self,
        first_id: &Hash,
        last_id: &Hash,
        ref_filter: Option<&str>,
    ) -> Result<(Vec<StandardEntry>, BTreeMap<Hash, Vec<Annotation>>), RslError> {
        let relevant = |entry: &StandardEntry| match ref_filter {
            None => true,
            Some(name) => entry.ref_name == name || entry.is_internal(),
        };

        // Phase 1: walk down from the tip to the end of the range,
        // pooling annotations only: annotations recorded after the range
        // may still refer into it.
        let mut pool: Vec<Annotation> = Vec::new();
        let mut cursor = self.latest_entry()?;
        while cursor.id() != last_id {
            if let Entry::Annotation(a) = &cursor {
                pool.push(a.clone());
            }
            cursor = self.parent_of(&cursor)?;
        }

        // Phase 2: collect relevant standard entries until `first_id` has
        // been processed.
        let mut stack: Vec<StandardEntry> = Vec::new();
        let mut in_range: HashSet<Hash> = HashSet::new();
        while cursor.id() != first_id {
            match &cursor {
                Entry::Standard(e) => {
                    if relevant(e) {
                        in_range.insert(e.id.clone());
                        stack.push(e.clone());
                    }
                }
                Entry::Annotation(a) => pool.push(a.clone()),
            }
            cursor = self.parent_of(&cursor)?;
        }

        // The range start itself: an annotation here refers to entries
        // before the range and is ignored.
        if let Entry::Standard(e) = &cursor {
            if relevant(e) {
                in_range.insert(e.id.clone());
                stack.push(e.clone());
            }
        }

        // Phase 3: attribute pooled annotations to collected entries,
        // iterating the pool newest-to-oldest-walked in reverse so each
        // entry's list comes out in ledger order.
        let mut annotations: BTreeMap<Hash, Vec<Annotation>> = BTreeMap::new();
        for annotation in pool.iter().rev() {
            for target in &annotation.targets {
                if in_range.contains(target) {
                    annotations
                        .entry(target.clone())
                        .or_default()
                        .push(annotation.clone());
                }
            }
        }

        // Phase 4: the stack was built walking backwards; reverse into
        // chronological order.
        stack.reverse();
        Ok((stack, annotations))
    }

    /// Walk backwards from `start` (inclusive), pooling annotations, until a
    /// standard entry satisfies `matches`. Returns that entry and the pooled
    /// annotations that refer to it, oldest first.
    fn find_backwards(
        &self,
        start: Entry,
        matches: impl Fn(&StandardEntry) -> bool,
    ) -> Result<(StandardEntry, Vec<Annotation>), RslError> {
        let mut annotations = Vec::new();
        let mut cursor = start;

        loop {
            match &cursor {
                Entry::Standard(e) if matches(e) => {
                    let found = e.clone();
                    let annotations = filter_annotations(annotations, &found.id);
                    return Ok((found, annotations));
                }
                Entry::Standard(_) => {}
                Entry::Annotation(a) => annotations.push(a.clone()),
            }
            cursor = self.parent_of(&cursor)?;
        }
    }
}

/// Annotations from a backwards walk that refer to `entry_id`, reversed into
/// ledger order (oldest first).
fn filter_annotations(walked: Vec<Annotation>, entry_id: &Hash) -> Vec<Annotation> {
    walked
        .into_iter()
        .rev()
        .filter(|a| a.refers_to(entry_id))
        .collect()
}
