use std::sync::Arc;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::posting::{decode_record, PostingList, PostingRecord};

/// Forward stream over one term's postings.
///
/// Records come back in strictly increasing doc_id order. A cursor is
/// single-consumer: it holds its own decode position over a shared
/// read-only `PostingList`, so concurrent queries each open their own.
///
/// A *partial* cursor materialises only a prefix of the list
/// (`doc_count() < rel_doc_count()`); callers opt in through the
/// provider when they will consume only a prefix of the results.
pub struct PostingCursor {
    list: Arc<PostingList>,
    /// Records this cursor may yield; ≤ the list's full count.
    doc_count: u32,
    rel_doc_count: u32,
    word_occurrence_total: u64,
    norm_d_t: u32,
    with_positions: bool,
    // decode state
    pos: usize,
    read: u32,
    current: Option<PostingRecord>,
}

impl PostingCursor {
    /// Open a cursor over a full list.
    pub fn new(list: Arc<PostingList>, with_positions: bool) -> Self {
        let full = list.doc_count();
        Self::with_limit(list, with_positions, full)
    }

    /// Open a cursor that yields at most `limit` leading records.
    /// `rel_doc_count` still reports the full list size.
    pub fn with_limit(list: Arc<PostingList>, with_positions: bool, limit: u32) -> Self {
        let rel_doc_count = list.doc_count();
        let doc_count = limit.min(rel_doc_count);
        let word_occurrence_total = list.occurrence_total();
        // Computed once when the cursor is acquired.
        let norm_d_t = (word_occurrence_total as f64).sqrt().floor() as u32;
        let with_positions = with_positions && list.with_positions();

        PostingCursor {
            list,
            doc_count,
            rel_doc_count,
            word_occurrence_total,
            norm_d_t,
            with_positions,
            pos: 0,
            read: 0,
            current: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Arc::new(PostingList::empty()), false)
    }

    /// Records this cursor will yield.
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// True document count of the term; exceeds `doc_count()` iff the
    /// cursor is partial.
    pub fn rel_doc_count(&self) -> u32 {
        self.rel_doc_count
    }

    pub fn word_occurrence_total(&self) -> u64 {
        self.word_occurrence_total
    }

    /// `floor(sqrt(word_occurrence_total))`.
    pub fn norm_d_t(&self) -> u32 {
        self.norm_d_t
    }

    pub fn has_positions(&self) -> bool {
        self.with_positions
    }

    pub fn is_partial(&self) -> bool {
        self.doc_count < self.rel_doc_count
    }

    /// Advance to the next record, or `None` once exhausted.
    pub fn next(&mut self) -> Result<Option<PostingRecord>> {
        if self.read >= self.doc_count {
            self.current = None;
            return Ok(None);
        }

        let prev = self.current.map(|r| r.doc_id.0);
        let (record, consumed) = decode_record(&self.list.bytes()[self.pos..], prev)?;
        self.pos += consumed;
        self.read += 1;
        self.current = Some(record);
        Ok(Some(record))
    }

    /// First record with `doc_id >= target`, or `None` past the end.
    /// Forward-only: a target at or before the current record answers
    /// with the current record.
    pub fn seek(&mut self, target: DocId) -> Result<Option<PostingRecord>> {
        if let Some(current) = self.current {
            if current.doc_id >= target {
                return Ok(Some(current));
            }
        }

        while let Some(record) = self.next()? {
            if record.doc_id >= target {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    /// Rewind to the start of the (possibly partial) list.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.read = 0;
        self.current = None;
    }
}
