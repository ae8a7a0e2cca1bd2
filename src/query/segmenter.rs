use crate::query::types::TermEntry;

/// A group of term indices whose query byte ranges are pairwise
/// disjoint. Groups index into the plan's entries so each cursor
/// keeps a single owner; the scorer resets cursors between groups.
pub type TermGroup = Vec<usize>;

/// Partition term entries into overlap-free groups.
///
/// Tokenizers may emit overlapping candidates for the same character
/// range (compound-word variants). Every group spans the full query;
/// scoring runs once per group and the results are OR-merged.
///
/// Entries must already be sorted by `(first_position asc,
/// query_rank desc)`; `sort_entries` does that.
pub fn partition(entries: &[TermEntry]) -> Vec<TermGroup> {
    let mut groups: Vec<TermGroup> = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let mut placed = false;

        for group in groups.iter_mut() {
            let last = &entries[*group.last().expect("groups are never empty")];
            if entry.first_position >= last.end() {
                group.push(idx);
                placed = true;
                break;
            }
        }

        if !placed {
            // New group, prefilled with the group-0 prefix that ends
            // before this term.
            let mut group = TermGroup::new();
            if let Some(first) = groups.first() {
                for &prior in first {
                    if entries[prior].end() <= entry.first_position {
                        group.push(prior);
                    }
                }
            }
            group.push(idx);
            groups.push(group);
        }
    }

    // Extend every later group with the compatible tail of group 0 so
    // each group covers the full query.
    if groups.len() > 1 {
        let head = groups[0].clone();
        for group in groups.iter_mut().skip(1) {
            let last_end = entries[*group.last().expect("non-empty")].end();
            for &tail in &head {
                if entries[tail].first_position >= last_end {
                    group.push(tail);
                }
            }
        }
    }

    groups
}

/// Sort for `partition`: position ascending, stronger rank first.
pub fn sort_entries(entries: &mut [TermEntry]) {
    entries.sort_by(|a, b| {
        a.first_position
            .cmp(&b.first_position)
            .then_with(|| b.query_rank.cmp(&a.query_rank))
    });
}
