use serde::{Serialize, Deserialize};
use std::cmp::Ordering;

/// Document identifier inside the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// Scores saturate here instead of wrapping; callers can compare
/// against this value to detect saturation.
pub const SCORE_SATURATED: i64 = i64::MAX - 4_000_000;

/// A document together with its relevance score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: i64,
}

impl ScoredDoc {
    pub fn new(doc_id: DocId, score: i64) -> Self {
        ScoredDoc { doc_id, score }
    }
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.doc_id == other.doc_id
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    // Higher score first; doc_id breaks ties so ordering is total.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}
