pub mod core;
pub mod compression;
pub mod analysis;
pub mod index;
pub mod query;
pub mod search;
pub mod mirror;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                        FATHOM QUERY PIPELINE                             │
└──────────────────────────────────────────────────────────────────────────┘

  user text ──> Analyzer (tokenizer + filters)         [analysis]
                     │  (word, rank, position)
                     ▼
               QueryPlanner                            [query::planner]
                     │  TermEntry { cursor, idf, norm_d_t, query_rank }
                     ▼
               Segmenter (overlap-free groups)         [query::segmenter]
                     │  one scoring run per group
                     ▼
               score_group  (driver/probe over         [search::scorer]
                     │       PostingCursor seek)       [index::cursor]
                     │  integer TF/IDF, proximity factor, saturation
                     ▼
               Combiner (upstream AND / AND-NOT,       [search::combiner]
                     │   OR-merge of groups, NOT)
                     ▼
               DeletionFilter pass                     [index::deletion]
                     │
                     ▼
               LikePostFilter (mirror SQL check)       [mirror::post_filter]
                     │
                     ▼
               ResultSet ──> RadixSelector top-K       [search::topk]

  QueryExecutor [search::executor] drives the stages, checks the
  CancelToken between cursor records and before mirror calls, and
  caches upstream-free steps [query::cache].
*/
