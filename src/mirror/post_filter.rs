use std::collections::HashSet;
use roaring::RoaringBitmap;
use tracing::debug;
use crate::core::cancel::CancelToken;
use crate::core::error::Result;
use crate::core::types::ScoredDoc;
use crate::mirror::adapter::{DocIdMapper, MirrorAdapter};
use crate::query::planner::LikeLiteral;
use crate::query::types::{QueryFlags, ResultSet};

/// Where a `LIKE` predicate verifies against the mirror.
#[derive(Debug, Clone)]
pub struct MirrorBinding {
    pub table: String,
    pub field: String,
    pub id_field: String,
}

/// Candidates submitted to the mirror: `end + 1 + 10` rounded up to
/// the next multiple of 100 when the caller bounded consumption,
/// otherwise `min_result_count`.
pub fn candidate_cap(end: Option<usize>, min_result_count: usize) -> usize {
    match end {
        Some(end) => {
            let wanted = end + 1 + 10;
            wanted.div_ceil(100) * 100
        }
        None => min_result_count,
    }
}

/// Confirmatory `LIKE` filter over the top ranked candidates.
pub struct LikePostFilter<'a> {
    adapter: &'a dyn MirrorAdapter,
    mapper: Option<&'a DocIdMapper>,
}

impl<'a> LikePostFilter<'a> {
    pub fn new(adapter: &'a dyn MirrorAdapter, mapper: Option<&'a DocIdMapper>) -> Self {
        LikePostFilter { adapter, mapper }
    }

    /// Narrow `result` to the candidates the mirror confirms. With
    /// `need_group_by`, a reduced set keeps the pre-filter ids as the
    /// group-by companion.
    pub fn apply(
        &self,
        result: &mut ResultSet,
        like: &LikeLiteral,
        binding: &MirrorBinding,
        flags: QueryFlags,
        min_result_count: usize,
        cancel: &CancelToken,
    ) -> Result<()> {
        if result.is_empty() {
            return Ok(());
        }

        let cap = candidate_cap(flags.end, min_result_count);
        let mut candidates: Vec<ScoredDoc> = result.iter().collect();
        if candidates.len() > cap {
            // Partial sort: only the leading `cap` need ordering.
            candidates.select_nth_unstable(cap);
            candidates.truncate(cap);
        }
        candidates.sort_unstable();

        // Translate to external ids when the mirror's id column is a
        // replacement field.
        let mut external_ids = Vec::with_capacity(candidates.len());
        let mut submitted = Vec::with_capacity(candidates.len());
        for scored in &candidates {
            let external = match self.mapper {
                Some(mapper) => match mapper.external_of(scored.doc_id) {
                    Some(external) => external,
                    None => continue,
                },
                None => scored.doc_id.0 as i64,
            };
            external_ids.push(external.to_string());
            submitted.push(scored.doc_id);
        }

        if submitted.is_empty() {
            result.retain(|_| false);
            result.rel_total_count = 0;
            return Ok(());
        }

        cancel.check()?;

        // The literal arrives with its quotes already doubled.
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {field} LIKE '{literal}' AND {id} IN ({ids})",
            id = binding.id_field,
            table = binding.table,
            field = binding.field,
            literal = like.raw,
            ids = external_ids.join(", "),
        );
        debug!(candidates = submitted.len(), "mirror LIKE verification");

        let returned = self.adapter.query_ids(&sql)?;

        let confirmed: HashSet<u32> = returned
            .into_iter()
            .filter_map(|external| match self.mapper {
                Some(mapper) => mapper.doc_of(external).map(|d| d.0),
                None => u32::try_from(external).ok(),
            })
            .collect();

        let reduced = confirmed.len() < submitted.len();
        if flags.need_group_by && reduced {
            let mut companion = RoaringBitmap::new();
            for doc_id in &submitted {
                companion.insert(doc_id.0);
            }
            result.group_by = Some(companion);
        }

        result.retain(|doc_id| confirmed.contains(&doc_id.0));
        result.rel_total_count = result.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use crate::core::types::DocId;

    /// Scripted adapter recording the statement it was given.
    struct FakeMirror {
        returns: Vec<i64>,
        seen_sql: Mutex<Vec<String>>,
    }

    impl FakeMirror {
        fn returning(returns: Vec<i64>) -> Self {
            FakeMirror {
                returns,
                seen_sql: Mutex::new(Vec::new()),
            }
        }
    }

    impl MirrorAdapter for FakeMirror {
        fn query_ids(&self, sql: &str) -> Result<Vec<i64>> {
            self.seen_sql.lock().push(sql.to_string());
            Ok(self.returns.clone())
        }
    }

    fn binding() -> MirrorBinding {
        MirrorBinding {
            table: "articles".to_string(),
            field: "body".to_string(),
            id_field: "id".to_string(),
        }
    }

    fn like(raw: &str, stripped: &str) -> LikeLiteral {
        LikeLiteral {
            raw: raw.to_string(),
            stripped: stripped.to_string(),
        }
    }

    fn scored(entries: &[(u32, i64)]) -> ResultSet {
        entries.iter().map(|&(d, s)| (DocId(d), s)).collect()
    }

    #[test]
    fn cap_rounds_up_to_hundreds() {
        assert_eq!(candidate_cap(Some(0), 500), 100);
        assert_eq!(candidate_cap(Some(89), 500), 100);
        assert_eq!(candidate_cap(Some(90), 500), 200);
        assert_eq!(candidate_cap(Some(189), 500), 200);
        assert_eq!(candidate_cap(None, 500), 500);
    }

    #[test]
    fn confirmed_ids_intersect_the_scored_set() {
        // Scenario: candidates {10,11,12}, mirror confirms {11,12}.
        let mirror = FakeMirror::returning(vec![11, 12]);
        let filter = LikePostFilter::new(&mirror, None);
        let mut result = scored(&[(10, 30), (11, 20), (12, 10)]);

        let flags = QueryFlags {
            need_group_by: true,
            ..QueryFlags::default()
        };
        filter
            .apply(
                &mut result,
                &like("%quick%", "quick"),
                &binding(),
                flags,
                100,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.contains(DocId(11)));
        assert!(result.contains(DocId(12)));
        assert!(!result.contains(DocId(10)));

        // Pre-filter ids retained for grouping.
        let companion = result.group_by.as_ref().unwrap();
        assert!(companion.contains(10) && companion.contains(11) && companion.contains(12));

        let sql = mirror.seen_sql.lock()[0].clone();
        assert!(sql.starts_with("SELECT id FROM articles WHERE body LIKE '%quick%' AND id IN ("));
        assert!(sql.contains("10") && sql.contains("11") && sql.contains("12"));
    }

    #[test]
    fn no_companion_when_nothing_was_filtered() {
        let mirror = FakeMirror::returning(vec![1, 2]);
        let filter = LikePostFilter::new(&mirror, None);
        let mut result = scored(&[(1, 5), (2, 6)]);
        let flags = QueryFlags {
            need_group_by: true,
            ..QueryFlags::default()
        };
        filter
            .apply(
                &mut result,
                &like("%x%", "x"),
                &binding(),
                flags,
                100,
                &CancelToken::new(),
            )
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.group_by.is_none());
    }

    #[test]
    fn cap_limits_submitted_candidates_to_best_scores() {
        let mirror = FakeMirror::returning((0..400).collect());
        let filter = LikePostFilter::new(&mirror, None);
        // 250 candidates, caller consumes up to index 40 -> cap 100.
        let mut result: ResultSet = (0..250u32).map(|i| (DocId(i), i as i64)).collect();

        let flags = QueryFlags {
            end: Some(40),
            ..QueryFlags::default()
        };
        filter
            .apply(
                &mut result,
                &like("%x%", "x"),
                &binding(),
                flags,
                500,
                &CancelToken::new(),
            )
            .unwrap();

        // Only the 100 best-scored candidates could survive.
        assert_eq!(result.len(), 100);
        assert!(result.contains(DocId(249)));
        assert!(!result.contains(DocId(0)));
    }

    #[test]
    fn id_translation_applies_both_ways() {
        let mapper = DocIdMapper::new([(DocId(1), 501), (DocId(2), 502), (DocId(3), 503)]);
        let mirror = FakeMirror::returning(vec![502]);
        let filter = LikePostFilter::new(&mirror, Some(&mapper));
        let mut result = scored(&[(1, 10), (2, 20), (3, 30)]);

        filter
            .apply(
                &mut result,
                &like("%x%", "x"),
                &binding(),
                QueryFlags::default(),
                100,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains(DocId(2)));

        let sql = mirror.seen_sql.lock()[0].clone();
        assert!(sql.contains("501") && sql.contains("502") && sql.contains("503"));
        assert!(!sql.contains("IN (1, 2, 3)"));
    }

    #[test]
    fn cancellation_precedes_the_mirror_call() {
        let mirror = FakeMirror::returning(vec![1]);
        let filter = LikePostFilter::new(&mirror, None);
        let mut result = scored(&[(1, 10)]);
        let token = CancelToken::new();
        token.cancel();

        let err = filter
            .apply(
                &mut result,
                &like("%x%", "x"),
                &binding(),
                QueryFlags::default(),
                100,
                &token,
            )
            .unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::Cancelled);
        assert!(mirror.seen_sql.lock().is_empty());
    }
}
