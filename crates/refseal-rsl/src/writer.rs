//! Appending entries to the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use refseal_store::ObjectStore;
use refseal_types::{names, Hash};
use tracing::debug;

use crate::codec;
use crate::entry::{Annotation, Entry, StandardEntry};
use crate::error::RslError;
use crate::reader::RslReader;

/// Appends standard entries and annotations to the ledger.
///
/// Every mutation is atomic with respect to the ledger reference: the tip is
/// read, the entry commit is written with that tip as its only parent, and
/// the reference advances by compare-and-swap from the observed tip. A
/// losing writer gets [`RslError::Conflict`] and is expected to re-read
/// remote state, re-validate its intent, and retry; the orphaned commit is
/// left for the object store to collect.
pub struct RslWriter {
    store: Arc<dyn ObjectStore>,
}

impl RslWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create the ledger reference pointing at the zero hash, which signals
    /// "empty ledger, the next write is genesis".
    pub fn initialize(&self) -> Result<(), RslError> {
        match self.store.read_ref(names::RSL_REF) {
            Ok(_) => return Err(RslError::AlreadyInitialized),
            Err(refseal_store::StoreError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let zero = self.store.hash_algorithm().zero();
        self.store
            .create_or_update_ref(names::RSL_REF, &zero, &zero)?;
        debug!("ledger initialized");
        Ok(())
    }

    /// Record that `ref_name` now points at `target_id`. Returns the new
    /// entry's id.
    pub fn record(&self, ref_name: &str, target_id: &Hash, sign: bool) -> Result<Hash, RslError> {
        names::validate_ref_name(ref_name)?;

        let tip = self.store.read_ref(names::RSL_REF)?;
        let entry = Entry::Standard(StandardEntry {
            id: self.store.hash_algorithm().zero(), // assigned below
            ref_name: ref_name.to_string(),
            target_id: target_id.clone(),
        });

        let id = self.append(&entry, &tip, sign)?;
        debug!(reference = ref_name, target = %target_id, entry = %id, "recorded entry");
        Ok(id)
    }

    /// Attach an annotation to one or more prior entries. Every target must
    /// be an entry in the ancestry of the current tip. Returns the new
    /// annotation's id.
    pub fn annotate(
        &self,
        targets: &[Hash],
        skip: bool,
        message: &str,
        sign: bool,
    ) -> Result<Hash, RslError> {
        if targets.is_empty() {
            return Err(RslError::EmptyTargets);
        }

        let tip = self.store.read_ref(names::RSL_REF)?;
        let known = self.entry_ids_up_to(&tip)?;
        for target in targets {
            if !known.contains(target) {
                return Err(RslError::UnknownTarget(target.clone()));
            }
        }

        let entry = Entry::Annotation(Annotation {
            id: self.store.hash_algorithm().zero(), // assigned below
            targets: targets.to_vec(),
            skip,
            message: message.to_string(),
        });

        let id = self.append(&entry, &tip, sign)?;
        debug!(targets = targets.len(), skip, annotation = %id, "recorded annotation");
        Ok(id)
    }

    /// Write the entry commit and advance the ledger reference from the
    /// observed tip.
    fn append(&self, entry: &Entry, tip: &Hash, sign: bool) -> Result<Hash, RslError> {
        let message = codec::encode(entry);
        let parents: Vec<Hash> = if tip.is_zero() {
            Vec::new()
        } else {
            vec![tip.clone()]
        };

        let id = self
            .store
            .write_commit(&self.store.empty_tree(), &parents, &message, sign)?;
        self.store.create_or_update_ref(names::RSL_REF, &id, tip)?;
        Ok(id)
    }

    /// All entry ids in the chain ending at `tip`. Empty for the zero tip.
    fn entry_ids_up_to(&self, tip: &Hash) -> Result<HashSet<Hash>, RslError> {
        let mut ids = HashSet::new();
        if tip.is_zero() {
            return Ok(ids);
        }

        let reader = RslReader::new(self.store.clone());
        let mut cursor = reader.entry(tip)?;
        loop {
            ids.insert(cursor.id().clone());
            match reader.parent_of(&cursor) {
                Ok(parent) => cursor = parent,
                Err(RslError::NotFound) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(ids)
    }
}
