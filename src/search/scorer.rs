use tracing::trace;
use crate::core::cancel::CancelToken;
use crate::core::error::Result;
use crate::core::types::SCORE_SATURATED;
use crate::index::posting::PostingRecord;
use crate::query::types::{add_scores, ResultSet, TermEntry};
use crate::search::combiner::Combiner;

/// Scoring variant. The two modes share the driver/probe shape and
/// the integer per-term formula; positional mode additionally scales
/// every non-first term by a proximity factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    Simple,
    Positional,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    /// Field weight, clamped ≥ 1 before use.
    pub field_rank: i64,
    pub mode: ScoreMode,
    /// Admissions before the one-word early termination arms.
    pub min_result_count: usize,
    /// Partial single-term driver; drop low-frequency tail records
    /// once armed.
    pub one_word_optimized: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupOutcome {
    pub admitted: usize,
    pub saturated: usize,
}

// Per-term statics copied out of the entries so the cursor borrows
// stay one at a time.
#[derive(Clone, Copy)]
struct TermStatics {
    query_rank: i64,
    query_count: u32,
    idf: i64,
    norm_d_t: u32,
    query_position: u32,
}

/// Score one segmenter group into `result` through the combiner.
///
/// The cheapest cursor (smallest doc_count) drives; every other
/// cursor is probed with `seek` and must match the driver's doc_id
/// exactly. Cursors are reset first so groups can share terms.
pub fn score_group(
    entries: &mut [TermEntry],
    group: &[usize],
    params: &ScoreParams,
    combiner: &Combiner,
    cancel: &CancelToken,
    result: &mut ResultSet,
) -> Result<GroupOutcome> {
    let mut outcome = GroupOutcome::default();

    let mut order: Vec<usize> = group.to_vec();
    order.sort_by_key(|&i| entries[i].cursor.doc_count());

    let n = order.len();
    if n == 0 || entries[order[0]].cursor.doc_count() == 0 {
        // A missing term empties the whole conjunction.
        return Ok(outcome);
    }

    for &i in &order {
        entries[i].cursor.reset();
    }

    let statics: Vec<TermStatics> = order
        .iter()
        .map(|&i| {
            let e = &entries[i];
            TermStatics {
                query_rank: e.query_rank,
                query_count: e.query_count,
                idf: e.idf,
                norm_d_t: e.cursor.norm_d_t(),
                query_position: e.first_position,
            }
        })
        .collect();

    let field_rank = params.field_rank.max(1);
    let ratio = if n > 1 { 2.0 / (n as f64 - 1.0) } else { 1.0 };
    let one_word = params.one_word_optimized && n == 1;
    let mut one_word_max = 0u32;

    let mut records: Vec<PostingRecord> = Vec::with_capacity(n);

    'driver: loop {
        cancel.check()?;

        let driver = match entries[order[0]].cursor.next()? {
            Some(record) => record,
            None => break,
        };

        if one_word {
            // Early termination for partial single-term queries: once
            // enough records are admitted, only records at or above
            // the running frequency maximum survive.
            if outcome.admitted >= params.min_result_count
                && driver.term_freq < one_word_max
            {
                continue;
            }
            one_word_max = one_word_max.max(driver.term_freq);
        }

        records.clear();
        records.push(driver);

        for k in 1..n {
            match entries[order[k]].cursor.seek(driver.doc_id)? {
                Some(record) if record.doc_id == driver.doc_id => records.push(record),
                Some(_) => continue 'driver,
                // A probe cursor ran out: no later driver doc can match.
                None => break 'driver,
            }
        }

        let total = match params.mode {
            ScoreMode::Simple => {
                let mut total = 0i64;
                for (record, stat) in records.iter().zip(&statics) {
                    total = add_scores(total, simple_term_score(field_rank, stat, record));
                }
                total
            }
            ScoreMode::Positional => positional_score(field_rank, &statics, &records, ratio),
        };

        if total == SCORE_SATURATED {
            outcome.saturated += 1;
        }

        if combiner.admit(result, driver.doc_id, total) {
            outcome.admitted += 1;
        }
    }

    trace!(
        terms = n,
        admitted = outcome.admitted,
        saturated = outcome.saturated,
        "group scored"
    );
    Ok(outcome)
}

/// `field_rank * query_rank * idf * term_freq * 1_000_000
///  / (norm_d_t * total_terms_in_doc)` in saturating i64.
fn simple_term_score(field_rank: i64, stat: &TermStatics, record: &PostingRecord) -> i64 {
    let numerator = field_rank
        .checked_mul(stat.query_rank)
        .and_then(|v| v.checked_mul(stat.idf))
        .and_then(|v| v.checked_mul(record.term_freq as i64))
        .and_then(|v| v.checked_mul(1_000_000));

    let denominator =
        stat.norm_d_t.max(1) as u64 * record.total_terms_in_doc.max(1) as u64;
    if denominator > i64::MAX as u64 {
        return 0;
    }

    match numerator {
        Some(numerator) => numerator / denominator as i64,
        None => SCORE_SATURATED,
    }
}

/// Positional total: the first term contributes its simple score,
/// every later term is scaled by the proximity of its document
/// position to the query layout.
fn positional_score(
    field_rank: i64,
    statics: &[TermStatics],
    records: &[PostingRecord],
    ratio: f64,
) -> i64 {
    let mut total = 0i64;

    for (i, (record, stat)) in records.iter().zip(statics).enumerate() {
        let score = simple_term_score(field_rank, stat, record);
        let per_term = if i == 0 {
            score
        } else {
            let prev_stat = &statics[i - 1];
            let prev_record = &records[i - 1];
            let factor = proximity_factor(
                stat,
                prev_stat,
                record,
                prev_record,
                ratio,
            );
            (score as f64 * factor) as i64
        };
        total = add_scores(total, per_term);
    }

    total
}

fn proximity_factor(
    stat: &TermStatics,
    prev_stat: &TermStatics,
    record: &PostingRecord,
    prev_record: &PostingRecord,
    ratio: f64,
) -> f64 {
    let q_delta = stat.query_position as i64 - prev_stat.query_position as i64;
    let p_delta = record.first_position as i64 - prev_record.first_position as i64;
    let mut delta = (q_delta - p_delta).abs() as f64;

    // Collapse near-alignment into three plateaus; beyond that the
    // raw distance dampens the factor.
    if delta < 0.031 {
        delta = 0.031;
    } else if delta <= 1.1 {
        delta = 0.5;
    } else if delta <= 2.1 {
        delta = 1.0;
    }

    (1.0 / delta).powf(ratio) * record.term_freq as f64 * prev_record.term_freq as f64
        / (stat.query_count.max(1) as f64 * prev_stat.query_count.max(1) as f64)
}
