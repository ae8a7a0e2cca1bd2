use std::collections::HashMap;
use roaring::RoaringBitmap;
use crate::analysis::token::Token;
use crate::core::types::{DocId, ScoredDoc, SCORE_SATURATED};
use crate::index::cursor::PostingCursor;

/// One word of the user query as the tokenizer produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryWord {
    pub word: String,
    pub rank: u32,
    /// Byte offset in the query string.
    pub position: u32,
    /// Byte span occupied in the query string.
    pub length: u32,
}

impl From<&Token> for QueryWord {
    fn from(token: &Token) -> Self {
        QueryWord {
            word: token.text.clone(),
            rank: token.rank,
            position: token.position,
            length: token.length,
        }
    }
}

/// Per-query execution flags. Closed enumeration; callers outside the
/// crate cannot extend it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueryFlags {
    /// Caller will consume only a prefix; enables partial cursors.
    pub can_load_part_of_docs: bool,
    /// Caller guarantees no further AND composition; enables the
    /// one-word optimisation.
    pub no_and_expression: bool,
    /// Caller wants a companion id-set for grouping.
    pub need_group_by: bool,
    /// Invert the predicate.
    pub not: bool,
    /// Highest result index the caller will consume.
    pub end: Option<usize>,
}

/// One distinct query term with its cursor and scoring statics.
///
/// The entry exclusively owns its cursor for the query's lifetime;
/// groups that share a term re-run it after `reset()`.
pub struct TermEntry {
    pub word: String,
    /// Occurrences of the word in the query.
    pub query_count: u32,
    /// Sum of per-occurrence ranks, clamped ≥ 1.
    pub query_rank: i64,
    /// Earliest byte offset of the word in the query string.
    pub first_position: u32,
    /// Byte span of the word at its first occurrence.
    pub word_length: u32,
    pub cursor: PostingCursor,
    /// `floor(log10(total_documents / doc_count + 1)) + 1`; zero for
    /// an empty cursor (never scored).
    pub idf: i64,
}

impl TermEntry {
    /// End of the byte range this term occupies in the query.
    pub fn end(&self) -> u32 {
        self.first_position + self.word_length
    }
}

/// Saturating score addition: sums clamp at `SCORE_SATURATED`.
pub fn add_scores(a: i64, b: i64) -> i64 {
    a.saturating_add(b).min(SCORE_SATURATED)
}

/// Mapping `doc_id → score` produced by one query step.
///
/// `not = true` marks the set as the complement of its keys; the
/// complement is never materialised, combiners honour the flag.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    docs: HashMap<u32, i64>,
    pub not: bool,
    /// May exceed `len()` when only a prefix of postings was consumed.
    pub rel_total_count: usize,
    /// Pre-mirror ids kept for grouping when the post-filter shrank
    /// the set.
    pub group_by: Option<RoaringBitmap>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.docs.contains_key(&doc_id.0)
    }

    pub fn score(&self, doc_id: DocId) -> Option<i64> {
        self.docs.get(&doc_id.0).copied()
    }

    /// Insert, adding (saturating) to an existing score.
    pub fn insert(&mut self, doc_id: DocId, score: i64) {
        self.docs
            .entry(doc_id.0)
            .and_modify(|s| *s = add_scores(*s, score))
            .or_insert(score);
    }

    /// Insert, replacing any existing score.
    pub fn put(&mut self, doc_id: DocId, score: i64) {
        self.docs.insert(doc_id.0, score);
    }

    pub fn remove(&mut self, doc_id: DocId) -> Option<i64> {
        self.docs.remove(&doc_id.0)
    }

    /// OR-merge: union by key, scores add saturating on collision.
    pub fn or_merge(&mut self, other: ResultSet) {
        for (doc_id, score) in other.docs {
            self.insert(DocId(doc_id), score);
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(DocId) -> bool) {
        self.docs.retain(|&doc_id, _| keep(DocId(doc_id)));
    }

    pub fn iter(&self) -> impl Iterator<Item = ScoredDoc> + '_ {
        self.docs
            .iter()
            .map(|(&doc_id, &score)| ScoredDoc::new(DocId(doc_id), score))
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.keys().map(|&id| DocId(id))
    }
}

impl FromIterator<(DocId, i64)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (DocId, i64)>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for (doc_id, score) in iter {
            set.insert(doc_id, score);
        }
        set
    }
}
