use std::collections::HashMap;
use std::sync::Arc;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::cursor::PostingCursor;
use crate::index::posting::{PostingList, PostingListBuilder, PostingRecord};

/// Source of posting cursors for the query core. Implementations are
/// shared read-only across concurrent queries; cursor acquisition is
/// their only synchronisation point.
pub trait PostingProvider: Send + Sync {
    /// Open a cursor for `word`. A missing term yields an empty
    /// cursor, never an error. `limit` materialises only a leading
    /// prefix (partial cursor).
    fn open_cursor(
        &self,
        word: &str,
        with_positions: bool,
        limit: Option<usize>,
    ) -> Result<PostingCursor>;

    fn total_documents(&self) -> u32;

    /// Whether cursors carry meaningful first positions; positional
    /// scoring must not be selected otherwise.
    fn has_positions(&self) -> bool;
}

/// Analyzer-driven in-memory index. This is the embedding/test/bench
/// harness for the core, not a storage engine; the persistent segment
/// format lives outside this crate.
pub struct InMemoryIndex {
    postings: HashMap<String, Arc<PostingList>>,
    total_docs: u32,
}

impl InMemoryIndex {
    pub fn builder(analyzer: Arc<Analyzer>) -> InMemoryIndexBuilder {
        InMemoryIndexBuilder {
            analyzer,
            terms: HashMap::new(),
            last_doc_id: None,
            total_docs: 0,
        }
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}

impl PostingProvider for InMemoryIndex {
    fn open_cursor(
        &self,
        word: &str,
        with_positions: bool,
        limit: Option<usize>,
    ) -> Result<PostingCursor> {
        match self.postings.get(word) {
            Some(list) => Ok(match limit {
                Some(limit) => {
                    PostingCursor::with_limit(list.clone(), with_positions, limit as u32)
                }
                None => PostingCursor::new(list.clone(), with_positions),
            }),
            None => Ok(PostingCursor::empty()),
        }
    }

    fn total_documents(&self) -> u32 {
        self.total_docs
    }

    fn has_positions(&self) -> bool {
        true
    }
}

/// Accumulates documents in ascending doc_id order, then seals into a
/// shared read-only `InMemoryIndex`.
pub struct InMemoryIndexBuilder {
    analyzer: Arc<Analyzer>,
    terms: HashMap<String, PostingListBuilder>,
    last_doc_id: Option<u32>,
    total_docs: u32,
}

impl InMemoryIndexBuilder {
    pub fn add_document(&mut self, doc_id: DocId, text: &str) -> Result<()> {
        if let Some(last) = self.last_doc_id {
            if doc_id.0 <= last {
                return Err(Error::new(
                    ErrorKind::Internal,
                    format!("documents must be added in doc_id order, got {}", doc_id.0),
                ));
            }
        }

        let tokens = self.analyzer.analyze(text);
        let total_terms = tokens.len() as u32;

        // Per distinct word: frequency and first byte position.
        let mut stats: HashMap<&str, (u32, u32)> = HashMap::new();
        for token in &tokens {
            stats
                .entry(token.text.as_str())
                .and_modify(|(freq, _)| *freq += 1)
                .or_insert((1, token.position));
        }

        // Deterministic insertion order keeps rebuilds identical.
        let mut words: Vec<(&str, (u32, u32))> = stats.into_iter().collect();
        words.sort_unstable_by_key(|(word, _)| *word);

        for (word, (term_freq, first_position)) in words {
            self.terms
                .entry(word.to_string())
                .or_insert_with(|| PostingListBuilder::new(true))
                .push(PostingRecord {
                    doc_id,
                    term_freq,
                    total_terms_in_doc: total_terms,
                    first_position,
                })?;
        }

        self.last_doc_id = Some(doc_id.0);
        self.total_docs += 1;
        Ok(())
    }

    pub fn build(self) -> InMemoryIndex {
        let postings = self
            .terms
            .into_iter()
            .map(|(word, builder)| (word, Arc::new(builder.build())))
            .collect();

        InMemoryIndex {
            postings,
            total_docs: self.total_docs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(docs: &[(u32, &str)]) -> InMemoryIndex {
        let mut builder = InMemoryIndex::builder(Arc::new(Analyzer::simple()));
        for &(doc_id, text) in docs {
            builder.add_document(DocId(doc_id), text).unwrap();
        }
        builder.build()
    }

    #[test]
    fn indexes_term_frequencies_and_positions() {
        let idx = index(&[(1, "red fish blue fish"), (2, "blue sky")]);
        assert_eq!(idx.total_documents(), 2);

        let mut cursor = idx.open_cursor("fish", true, None).unwrap();
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first.doc_id, DocId(1));
        assert_eq!(first.term_freq, 2);
        assert_eq!(first.total_terms_in_doc, 4);
        assert_eq!(first.first_position, 4); // byte offset of "fish"
        assert!(cursor.next().unwrap().is_none());

        let cursor = idx.open_cursor("blue", true, None).unwrap();
        assert_eq!(cursor.doc_count(), 2);
    }

    #[test]
    fn missing_term_yields_empty_cursor() {
        let idx = index(&[(1, "only words here")]);
        let mut cursor = idx.open_cursor("absent", false, None).unwrap();
        assert_eq!(cursor.doc_count(), 0);
        assert!(cursor.next().unwrap().is_none());
    }

    #[test]
    fn out_of_order_documents_are_rejected() {
        let mut builder = InMemoryIndex::builder(Arc::new(Analyzer::simple()));
        builder.add_document(DocId(5), "a b").unwrap();
        assert!(builder.add_document(DocId(5), "c").is_err());
        assert!(builder.add_document(DocId(4), "c").is_err());
    }
}
