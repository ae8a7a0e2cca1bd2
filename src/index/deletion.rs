use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use crate::core::types::DocId;

/// Tombstoned document ids, applied to results after scoring.
///
/// Shared read-only by running queries; the generation counter bumps
/// on every mutation so cached results can detect staleness.
#[derive(Debug, Default)]
pub struct DeletionFilter {
    deleted: RwLock<RoaringBitmap>,
    generation: AtomicU64,
}

impl DeletionFilter {
    pub fn new() -> Self {
        DeletionFilter::default()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.deleted.read().contains(doc_id.0)
    }

    pub fn delete(&self, doc_id: DocId) {
        let mut deleted = self.deleted.write();
        if deleted.insert(doc_id.0) {
            self.generation.fetch_add(1, Ordering::Release);
        }
    }

    pub fn delete_many(&self, doc_ids: impl IntoIterator<Item = DocId>) {
        let mut deleted = self.deleted.write();
        let mut changed = false;
        for doc_id in doc_ids {
            changed |= deleted.insert(doc_id.0);
        }
        if changed {
            self.generation.fetch_add(1, Ordering::Release);
        }
    }

    pub fn len(&self) -> u64 {
        self.deleted.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.read().is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
