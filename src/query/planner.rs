use std::collections::HashMap;
use tracing::debug;
use crate::core::config::SearchConfig;
use crate::core::error::{Error, Result};
use crate::index::memory::PostingProvider;
use crate::query::types::{QueryFlags, QueryWord, TermEntry};

/// Plan for one query step: distinct terms with open cursors and
/// their scoring statics.
pub struct QueryPlan {
    pub entries: Vec<TermEntry>,
    /// `floor(sqrt(Σ query_rank²))`; callers use it for length
    /// normalisation, the core does not apply it.
    pub norm_ranks: i64,
    /// Partial driver cursor + early termination selected.
    pub one_word_optimized: bool,
    pub total_documents: u32,
}

impl QueryPlan {
    /// True when any term has an empty cursor; AND semantics make the
    /// whole step empty then.
    pub fn has_missing_term(&self) -> bool {
        self.entries.iter().any(|e| e.cursor.doc_count() == 0)
    }
}

/// Builds query plans against a posting provider.
pub struct QueryPlanner<'a> {
    provider: &'a dyn PostingProvider,
    config: &'a SearchConfig,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(provider: &'a dyn PostingProvider, config: &'a SearchConfig) -> Self {
        QueryPlanner { provider, config }
    }

    pub fn plan(
        &self,
        words: &[QueryWord],
        flags: QueryFlags,
        with_positions: bool,
    ) -> Result<QueryPlan> {
        // Fold repeated words into one entry each: query_count and
        // query_rank accumulate, first_position stays the earliest.
        struct Folded {
            word: String,
            query_count: u32,
            query_rank: i64,
            first_position: u32,
            word_length: u32,
        }

        let mut folded: Vec<Folded> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for word in words {
            match index_of.get(&word.word) {
                Some(&i) => {
                    folded[i].query_count += 1;
                    folded[i].query_rank += word.rank as i64;
                }
                None => {
                    index_of.insert(word.word.clone(), folded.len());
                    folded.push(Folded {
                        word: word.word.clone(),
                        query_count: 1,
                        query_rank: word.rank as i64,
                        first_position: word.position,
                        word_length: word.length,
                    });
                }
            }
        }

        let single_term = folded.len() == 1;
        let partial = single_term && flags.can_load_part_of_docs;
        let limit = partial.then_some(self.config.partial_load_limit);
        let one_word_optimized = partial && flags.no_and_expression;

        let total_documents = self.provider.total_documents();
        let mut entries = Vec::with_capacity(folded.len());

        for term in folded {
            let cursor = self
                .provider
                .open_cursor(&term.word, with_positions, limit)?;

            let idf = if cursor.doc_count() > 0 {
                integer_idf(total_documents, cursor.doc_count())
            } else {
                0
            };

            entries.push(TermEntry {
                word: term.word,
                query_count: term.query_count,
                query_rank: term.query_rank.max(1),
                first_position: term.first_position,
                word_length: term.word_length,
                cursor,
                idf,
            });
        }

        let norm_ranks = norm_ranks(&entries);

        debug!(
            terms = entries.len(),
            one_word_optimized, norm_ranks, "query planned"
        );

        Ok(QueryPlan {
            entries,
            norm_ranks,
            one_word_optimized,
            total_documents,
        })
    }
}

/// `floor(log10(total_documents / doc_count + 1)) + 1`, integer
/// division inside.
fn integer_idf(total_documents: u32, doc_count: u32) -> i64 {
    let ratio = (total_documents as u64 / doc_count as u64) + 1;
    (ratio as f64).log10().floor() as i64 + 1
}

fn norm_ranks(entries: &[TermEntry]) -> i64 {
    let sum_sq: i64 = entries.iter().map(|e| e.query_rank * e.query_rank).sum();
    (sum_sq as f64).sqrt().floor() as i64
}

/// A `LIKE` literal split into the raw form (sent to the mirror) and
/// the stripped form (tokenized for index matching).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeLiteral {
    /// As captured from the query, `%` wildcards and doubled quotes
    /// intact.
    pub raw: String,
    /// `%` stripped, `''` collapsed to `'`.
    pub stripped: String,
}

/// Prepare a `LIKE` literal. An empty remainder after stripping is a
/// query error.
pub fn prepare_like_literal(literal: &str) -> Result<LikeLiteral> {
    let stripped = literal.replace('%', "").replace("''", "'");

    if stripped.trim().is_empty() {
        return Err(Error::invalid_query(format!(
            "empty LIKE literal after stripping wildcards: {:?}",
            literal
        )));
    }

    Ok(LikeLiteral {
        raw: literal.to_string(),
        stripped,
    })
}
