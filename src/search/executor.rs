use std::sync::Arc;
use tracing::debug;
use crate::analysis::analyzer::Analyzer;
use crate::core::cancel::CancelToken;
use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::EngineStats;
use crate::core::types::ScoredDoc;
use crate::index::deletion::DeletionFilter;
use crate::index::memory::PostingProvider;
use crate::mirror::adapter::{DocIdMapper, MirrorAdapter};
use crate::mirror::post_filter::{LikePostFilter, MirrorBinding};
use crate::query::cache::{QueryCache, QueryKey};
use crate::query::planner::{prepare_like_literal, QueryPlanner};
use crate::query::segmenter;
use crate::query::types::{QueryFlags, QueryWord, ResultSet};
use crate::search::combiner::{apply_not, Combiner};
use crate::search::scorer::{score_group, ScoreMode, ScoreParams};
use crate::search::topk::RadixSelector;

/// Query surface variant.
#[derive(Debug, Clone)]
pub enum QueryKind {
    /// Phrase / multi-word query over the index.
    MultiWord(String),
    /// `LIKE` literal with `%` wildcards and doubled quotes; verified
    /// against the mirror after scoring.
    Like(String),
}

/// One query step handed to the executor by the SQL layer.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub kind: QueryKind,
    pub field_rank: i64,
    pub flags: QueryFlags,
    /// Mirror binding; required for the `LIKE` variant.
    pub mirror: Option<MirrorBinding>,
}

impl SearchRequest {
    pub fn multi_word(text: impl Into<String>) -> Self {
        SearchRequest {
            kind: QueryKind::MultiWord(text.into()),
            field_rank: 1,
            flags: QueryFlags::default(),
            mirror: None,
        }
    }

    pub fn like(literal: impl Into<String>, binding: MirrorBinding) -> Self {
        SearchRequest {
            kind: QueryKind::Like(literal.into()),
            field_rank: 1,
            flags: QueryFlags::default(),
            mirror: Some(binding),
        }
    }

    pub fn with_field_rank(mut self, field_rank: i64) -> Self {
        self.field_rank = field_rank;
        self
    }

    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Pipeline stages bracketed by step hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStep {
    Plan,
    Score,
    Combine,
    Mirror,
}

/// Observer invoked around each pipeline stage.
pub trait StepHook: Send + Sync {
    fn before(&self, _step: ExecStep) {}
    fn after(&self, _step: ExecStep, _size: usize) {}
}

/// Default hook: stage boundaries as tracing events.
struct TracingHook;

impl StepHook for TracingHook {
    fn after(&self, step: ExecStep, size: usize) {
        debug!(?step, size, "stage done");
    }
}

/// Stateless-per-query executor over a shared read-only index.
///
/// The provider, deletion filter, analyzer and id maps are injected
/// at table-open and shared across concurrent queries; everything a
/// query mutates is local to the call.
pub struct QueryExecutor {
    provider: Arc<dyn PostingProvider>,
    analyzer: Arc<Analyzer>,
    deletions: Arc<DeletionFilter>,
    mirror: Option<Arc<dyn MirrorAdapter>>,
    mapper: Option<Arc<DocIdMapper>>,
    cache: QueryCache,
    config: SearchConfig,
    hooks: Vec<Box<dyn StepHook>>,
    pub stats: EngineStats,
}

impl QueryExecutor {
    pub fn new(
        provider: Arc<dyn PostingProvider>,
        analyzer: Arc<Analyzer>,
        deletions: Arc<DeletionFilter>,
    ) -> Self {
        let config = SearchConfig::default();
        QueryExecutor {
            provider,
            analyzer,
            deletions,
            mirror: None,
            mapper: None,
            cache: QueryCache::new(config.cache_entries),
            config,
            hooks: vec![Box::new(TracingHook)],
            stats: EngineStats::new(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.cache = QueryCache::new(config.cache_entries);
        self.config = config;
        self
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn MirrorAdapter>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_mapper(mut self, mapper: Arc<DocIdMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn add_hook(mut self, hook: Box<dyn StepHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute one query step. The upstream set is the outer boolean
    /// context and is never mutated.
    pub fn execute(
        &self,
        request: &SearchRequest,
        upstream: Option<&ResultSet>,
        cancel: &CancelToken,
    ) -> Result<ResultSet> {
        self.stats.record_query();
        let outcome = self.execute_inner(request, upstream, cancel);
        if let Err(error) = &outcome {
            if error.kind == ErrorKind::Cancelled {
                self.stats.record_cancellation();
            }
        }
        outcome
    }

    /// Rank a result with the bounded radix selector; at most
    /// `config.top` entries, best first.
    pub fn top_docs(&self, result: &ResultSet) -> Vec<ScoredDoc> {
        let mut selector = RadixSelector::new(self.config.top);
        for scored in result.iter() {
            selector.add(scored);
        }
        selector.into_sorted_iter().collect()
    }

    fn execute_inner(
        &self,
        request: &SearchRequest,
        upstream: Option<&ResultSet>,
        cancel: &CancelToken,
    ) -> Result<ResultSet> {
        let flags = request.flags;

        let (like, text) = match &request.kind {
            QueryKind::Like(literal) => {
                let like = prepare_like_literal(literal)?;
                let text = like.stripped.clone();
                (Some(like), text)
            }
            QueryKind::MultiWord(text) => (None, text.clone()),
        };

        let tokens = self.analyzer.analyze(&text);
        let words: Vec<QueryWord> = tokens.iter().map(QueryWord::from).collect();
        if words.is_empty() {
            return Ok(ResultSet::new());
        }

        // Plain multi-word steps without outer context are cacheable;
        // mirror-verified and grouped steps are not.
        let cacheable = self.config.cache_entries > 0
            && upstream.is_none()
            && !flags.need_group_by
            && matches!(request.kind, QueryKind::MultiWord(_));
        let generation = self.deletions.generation();
        let cache_key = QueryKey {
            text,
            field_rank: request.field_rank,
            flags,
        };
        if cacheable {
            if let Some(hit) = self.cache.get(&cache_key, generation) {
                self.stats.record_cache_hit();
                return Ok((*hit).clone());
            }
            self.stats.record_cache_miss();
        }

        self.before(ExecStep::Plan);
        let planner = QueryPlanner::new(self.provider.as_ref(), &self.config);
        let mut plan = planner.plan(&words, flags, self.provider.has_positions())?;
        self.after(ExecStep::Plan, plan.entries.len());

        let positional = self.provider.has_positions() && plan.entries.len() > 1;
        let groups = if positional {
            segmenter::sort_entries(&mut plan.entries);
            segmenter::partition(&plan.entries)
        } else {
            vec![(0..plan.entries.len()).collect()]
        };

        let params = ScoreParams {
            field_rank: request.field_rank,
            mode: if positional {
                ScoreMode::Positional
            } else {
                ScoreMode::Simple
            },
            min_result_count: self.config.min_result_count,
            one_word_optimized: plan.one_word_optimized,
        };

        // A negated predicate collects its raw match set first and
        // composes with the upstream afterwards.
        let scoring_combiner = if flags.not {
            Combiner::passthrough()
        } else {
            Combiner::new(upstream)
        };

        self.before(ExecStep::Score);
        let mut merged = ResultSet::new();
        for group in &groups {
            let mut group_result = ResultSet::new();
            let outcome = score_group(
                &mut plan.entries,
                group,
                &params,
                &scoring_combiner,
                cancel,
                &mut group_result,
            )?;
            for _ in 0..outcome.saturated {
                self.stats.record_saturation();
            }
            merged.or_merge(group_result);
        }
        self.after(ExecStep::Score, merged.len());

        self.before(ExecStep::Combine);
        let mut result = if flags.not {
            apply_not(merged, upstream)
        } else {
            merged
        };

        // Deletion pass runs after combining, before any mirror call.
        let mut deleted_count = 0usize;
        result.retain(|doc_id| {
            if self.deletions.contains(doc_id) {
                deleted_count += 1;
                false
            } else {
                true
            }
        });

        result.rel_total_count = if plan.one_word_optimized && upstream.is_none() {
            (plan.entries[0].cursor.rel_doc_count() as usize).saturating_sub(deleted_count)
        } else {
            result.len()
        };
        self.after(ExecStep::Combine, result.len());

        if let Some(like) = &like {
            let adapter = self.mirror.as_ref().ok_or_else(|| {
                Error::new(
                    ErrorKind::MirrorUnavailable,
                    "no mirror adapter configured".to_string(),
                )
            })?;
            let binding = request.mirror.as_ref().ok_or_else(|| {
                Error::invalid_query("LIKE query without a mirror binding")
            })?;

            self.before(ExecStep::Mirror);
            self.stats.record_mirror_call();
            let filter = LikePostFilter::new(adapter.as_ref(), self.mapper.as_deref());
            filter.apply(
                &mut result,
                like,
                binding,
                flags,
                self.config.min_result_count,
                cancel,
            )?;
            self.after(ExecStep::Mirror, result.len());
        }

        if cacheable {
            self.cache
                .put(cache_key, Arc::new(result.clone()), generation);
        }

        Ok(result)
    }

    fn before(&self, step: ExecStep) {
        for hook in &self.hooks {
            hook.before(step);
        }
    }

    fn after(&self, step: ExecStep, size: usize) {
        for hook in &self.hooks {
            hook.after(step, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;
    use crate::index::memory::{InMemoryIndex, InMemoryIndexBuilder};
    use crate::mirror::sqlite::SqliteMirror;

    fn build_index(docs: &[(u32, &str)]) -> Arc<InMemoryIndex> {
        let mut builder: InMemoryIndexBuilder =
            InMemoryIndex::builder(Arc::new(Analyzer::simple()));
        for &(doc_id, text) in docs {
            builder.add_document(DocId(doc_id), text).unwrap();
        }
        Arc::new(builder.build())
    }

    fn executor(docs: &[(u32, &str)]) -> QueryExecutor {
        QueryExecutor::new(
            build_index(docs),
            Arc::new(Analyzer::simple()),
            Arc::new(DeletionFilter::new()),
        )
    }

    #[test]
    fn single_term_ranking_prefers_higher_frequency() {
        let exec = executor(&[
            (1, "ember sky sky sky"),
            (2, "ember ember ember sky"),
            (3, "sky sky sky sky"),
        ]);
        let result = exec
            .execute(
                &SearchRequest::multi_word("ember"),
                None,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        let top = exec.top_docs(&result);
        assert_eq!(top[0].doc_id, DocId(2));
        assert_eq!(top[1].doc_id, DocId(1));
    }

    #[test]
    fn two_term_query_intersects() {
        let exec = executor(&[
            (1, "alpha only"),
            (2, "beta only"),
            (42, "alpha beta together"),
        ]);
        let result = exec
            .execute(
                &SearchRequest::multi_word("alpha beta"),
                None,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains(DocId(42)));
        assert!(result.score(DocId(42)).unwrap() > 0);
    }

    #[test]
    fn upstream_and_composition() {
        let exec = executor(&[(1, "match here"), (2, "match there"), (3, "match again")]);
        let upstream: ResultSet = [(DocId(1), 100i64), (DocId(3), 300i64)]
            .into_iter()
            .collect();

        let result = exec
            .execute(
                &SearchRequest::multi_word("match"),
                Some(&upstream),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.contains(DocId(1)));
        assert!(!result.contains(DocId(2)));
        // Upstream scores merged into survivors.
        assert!(result.score(DocId(1)).unwrap() > 100);
        assert_eq!(upstream.score(DocId(1)), Some(100));
    }

    #[test]
    fn negated_step_subtracts_from_upstream() {
        let exec = executor(&[(1, "noise"), (2, "signal"), (3, "noise")]);
        let upstream: ResultSet = [(DocId(1), 10i64), (DocId(2), 20i64), (DocId(3), 30i64)]
            .into_iter()
            .collect();

        let request = SearchRequest::multi_word("noise").with_flags(QueryFlags {
            not: true,
            ..QueryFlags::default()
        });
        let result = exec
            .execute(&request, Some(&upstream), &CancelToken::new())
            .unwrap();

        assert!(!result.not);
        assert_eq!(result.len(), 1);
        assert_eq!(result.score(DocId(2)), Some(20));
    }

    #[test]
    fn negated_step_without_upstream_is_a_complement_set() {
        let exec = executor(&[(1, "noise"), (2, "signal")]);
        let request = SearchRequest::multi_word("noise").with_flags(QueryFlags {
            not: true,
            ..QueryFlags::default()
        });
        let result = exec.execute(&request, None, &CancelToken::new()).unwrap();
        assert!(result.not);
        assert!(result.contains(DocId(1)));
    }

    #[test]
    fn deleted_documents_are_dropped_after_scoring() {
        let deletions = Arc::new(DeletionFilter::new());
        let exec = QueryExecutor::new(
            build_index(&[(1, "word"), (2, "word"), (3, "word")]),
            Arc::new(Analyzer::simple()),
            deletions.clone(),
        );
        deletions.delete(DocId(2));

        let result = exec
            .execute(&SearchRequest::multi_word("word"), None, &CancelToken::new())
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains(DocId(1)));
        assert!(!result.contains(DocId(2)));
        assert!(result.contains(DocId(3)));
        // Non-optimised path: the count is the surviving size.
        assert_eq!(result.rel_total_count, 2);
    }

    #[test]
    fn one_word_path_estimates_total_from_rel_doc_count() {
        let deletions = Arc::new(DeletionFilter::new());
        let exec = QueryExecutor::new(
            build_index(&[(1, "word"), (2, "word"), (3, "word"), (4, "word"), (5, "word")]),
            Arc::new(Analyzer::simple()),
            deletions.clone(),
        )
        .with_config(SearchConfig {
            partial_load_limit: 3,
            ..SearchConfig::default()
        });
        deletions.delete(DocId(1));

        let request = SearchRequest::multi_word("word").with_flags(QueryFlags {
            can_load_part_of_docs: true,
            no_and_expression: true,
            ..QueryFlags::default()
        });
        let result = exec.execute(&request, None, &CancelToken::new()).unwrap();

        // Three records materialised, one deleted among them; the
        // term's true doc count is 5.
        assert_eq!(result.len(), 2);
        assert_eq!(result.rel_total_count, 5 - 1);
    }

    #[test]
    fn like_query_verifies_against_the_mirror() {
        let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
        mirror
            .execute_batch(
                "CREATE TABLE articles (id INTEGER PRIMARY KEY, body TEXT);
                 INSERT INTO articles VALUES
                     (10, 'quicksilver mood'),
                     (11, 'the quick fox'),
                     (12, 'quick thinking');",
            )
            .unwrap();

        let exec = QueryExecutor::new(
            build_index(&[
                (10, "quicksilver mood"),
                (11, "the quick fox"),
                (12, "quick thinking"),
            ]),
            Arc::new(Analyzer::simple()),
            Arc::new(DeletionFilter::new()),
        )
        .with_mirror(mirror);

        let binding = MirrorBinding {
            table: "articles".to_string(),
            field: "body".to_string(),
            id_field: "id".to_string(),
        };
        // Tokenized form matches docs 11 and 12; the mirror confirms
        // the wildcard semantics ("% quick%" style patterns).
        let request = SearchRequest::like("%quick %", binding).with_flags(QueryFlags {
            need_group_by: true,
            ..QueryFlags::default()
        });
        let result = exec.execute(&request, None, &CancelToken::new()).unwrap();

        assert!(result.contains(DocId(11)));
        assert!(result.contains(DocId(12)));
        assert!(!result.contains(DocId(10)));
    }

    #[test]
    fn like_without_adapter_is_a_mirror_error() {
        let exec = executor(&[(1, "word")]);
        let binding = MirrorBinding {
            table: "t".to_string(),
            field: "f".to_string(),
            id_field: "id".to_string(),
        };
        let err = exec
            .execute(
                &SearchRequest::like("%word%", binding),
                None,
                &CancelToken::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MirrorUnavailable);
    }

    #[test]
    fn empty_like_literal_is_invalid() {
        let exec = executor(&[(1, "word")]);
        let binding = MirrorBinding {
            table: "t".to_string(),
            field: "f".to_string(),
            id_field: "id".to_string(),
        };
        let err = exec
            .execute(
                &SearchRequest::like("%%", binding),
                None,
                &CancelToken::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidQuery);
    }

    #[test]
    fn repeated_query_hits_the_cache_until_a_deletion() {
        let deletions = Arc::new(DeletionFilter::new());
        let exec = QueryExecutor::new(
            build_index(&[(1, "cached term"), (2, "cached term")]),
            Arc::new(Analyzer::simple()),
            deletions.clone(),
        );
        let request = SearchRequest::multi_word("cached");

        let first = exec.execute(&request, None, &CancelToken::new()).unwrap();
        let second = exec.execute(&request, None, &CancelToken::new()).unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(exec.stats.snapshot().cache_hits, 1);

        deletions.delete(DocId(1));
        let third = exec.execute(&request, None, &CancelToken::new()).unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(exec.stats.snapshot().cache_hits, 1);
    }

    #[test]
    fn cancellation_surfaces_and_is_counted() {
        let exec = executor(&[(1, "word")]);
        let token = CancelToken::new();
        token.cancel();
        let err = exec
            .execute(&SearchRequest::multi_word("word"), None, &token)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(exec.stats.snapshot().cancelled_queries, 1);
    }

    #[test]
    fn empty_query_text_yields_an_empty_set() {
        let exec = executor(&[(1, "word")]);
        let result = exec
            .execute(&SearchRequest::multi_word("   "), None, &CancelToken::new())
            .unwrap();
        assert!(result.is_empty());
    }
}
