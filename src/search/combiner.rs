use crate::core::types::DocId;
use crate::query::types::{add_scores, ResultSet};

/// Admission policy composing a query step with the borrowed upstream
/// boolean context. The upstream set is never mutated; score merging
/// writes into the child set.
pub struct Combiner<'a> {
    upstream: Option<&'a ResultSet>,
}

impl<'a> Combiner<'a> {
    pub fn new(upstream: Option<&'a ResultSet>) -> Self {
        Combiner { upstream }
    }

    /// Without an upstream the combiner is transparent.
    pub fn passthrough() -> Self {
        Combiner { upstream: None }
    }

    /// Offer a scored document; returns whether it was admitted.
    ///
    /// - no upstream: insert unconditionally;
    /// - positive upstream: insert iff member, upstream score added;
    /// - negative upstream (`not`): insert iff non-member.
    pub fn admit(&self, result: &mut ResultSet, doc_id: DocId, score: i64) -> bool {
        match self.upstream {
            None => {
                result.insert(doc_id, score);
                true
            }
            Some(upstream) if !upstream.not => match upstream.score(doc_id) {
                Some(upstream_score) => {
                    result.insert(doc_id, add_scores(score, upstream_score));
                    true
                }
                None => false,
            },
            Some(upstream) => {
                if upstream.contains(doc_id) {
                    false
                } else {
                    result.insert(doc_id, score);
                    true
                }
            }
        }
    }
}

/// Resolve a negated predicate against its upstream context.
///
/// `matched` is the raw (upstream-unfiltered) match set. With an
/// upstream, the outcome is `upstream \ matched` carrying upstream
/// scores; without one, `matched` is flagged as a complement set so
/// the complement is never materialised.
pub fn apply_not(matched: ResultSet, upstream: Option<&ResultSet>) -> ResultSet {
    match upstream {
        Some(upstream) if !upstream.not => {
            let mut out = ResultSet::new();
            for scored in upstream.iter() {
                if !matched.contains(scored.doc_id) {
                    out.put(scored.doc_id, scored.score);
                }
            }
            out
        }
        _ => {
            let mut out = matched;
            out.not = true;
            out
        }
    }
}
