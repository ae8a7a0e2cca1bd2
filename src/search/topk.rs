use crate::core::types::ScoredDoc;

/// Number of radix buckets: 256 fine buckets for ranks below 65 536,
/// then four coarse overflow buckets.
const BUCKET_COUNT: usize = 260;

/// Coarse radix of a non-negative rank.
fn bucket_of(score: i64) -> usize {
    let rank = score.max(0);
    if rank < 65_536 {
        (rank / 256) as usize
    } else if rank < 100_000 {
        256
    } else if rank < 1_000_000 {
        257
    } else if rank < 10_000_000 {
        258
    } else {
        259
    }
}

/// Bounded top-K structure over coarse radix buckets.
///
/// Candidates below the moving floor (`min_radix`) are counted but
/// not stored, so a large candidate set never needs a full sort. The
/// floor rises every `top` additions to keep at most a little over
/// `top` entries resident.
pub struct RadixSelector {
    buckets: Vec<Vec<ScoredDoc>>,
    top: usize,
    count: usize,
    min_radix: usize,
    max_radix: usize,
}

impl RadixSelector {
    pub fn new(top: usize) -> Self {
        RadixSelector {
            buckets: (0..BUCKET_COUNT).map(|_| Vec::new()).collect(),
            top: top.max(1),
            count: 0,
            min_radix: 0,
            max_radix: 0,
        }
    }

    /// Candidates offered so far, stored or not.
    pub fn total_count(&self) -> usize {
        self.count
    }

    pub fn add(&mut self, doc: ScoredDoc) {
        let bucket = bucket_of(doc.score);
        self.count += 1;

        if bucket < self.min_radix {
            // Below the floor: counted, never stored.
            return;
        }

        self.buckets[bucket].push(doc);
        if bucket > self.max_radix {
            self.max_radix = bucket;
        }

        if self.count % self.top == 0 {
            self.raise_floor();
        }
    }

    /// Walk buckets downward; the floor lands on the first bucket
    /// where the running size exceeds `top`. Entries below it are
    /// discarded to bound memory.
    fn raise_floor(&mut self) {
        let mut running = 0usize;
        let mut floor = self.min_radix;

        for radix in (self.min_radix..=self.max_radix).rev() {
            running += self.buckets[radix].len();
            if running > self.top {
                floor = radix;
                break;
            }
        }

        if floor > self.min_radix {
            self.min_radix = floor;
            for radix in 0..floor {
                self.buckets[radix].clear();
            }
        }
    }

    /// Consume into the top `top` entries, best bucket first. Each
    /// bucket is sorted on first visit only.
    pub fn into_sorted_iter(self) -> TopKIter {
        TopKIter {
            current_radix: self.max_radix as isize,
            index_within_bucket: 0,
            yielded: 0,
            floor: self.min_radix as isize,
            top: self.top,
            buckets: self.buckets,
            sorted: false,
        }
    }
}

/// Lazily-sorting iterator over the selector's buckets, highest radix
/// first; within a bucket, standard `ScoredDoc` order.
pub struct TopKIter {
    buckets: Vec<Vec<ScoredDoc>>,
    current_radix: isize,
    index_within_bucket: usize,
    yielded: usize,
    floor: isize,
    top: usize,
    sorted: bool,
}

impl Iterator for TopKIter {
    type Item = ScoredDoc;

    fn next(&mut self) -> Option<ScoredDoc> {
        if self.yielded >= self.top {
            return None;
        }

        while self.current_radix >= self.floor {
            let bucket = &mut self.buckets[self.current_radix as usize];

            if !self.sorted {
                bucket.sort_unstable();
                self.sorted = true;
            }

            if self.index_within_bucket < bucket.len() {
                let doc = bucket[self.index_within_bucket];
                self.index_within_bucket += 1;
                self.yielded += 1;
                return Some(doc);
            }

            self.current_radix -= 1;
            self.index_within_bucket = 0;
            self.sorted = false;
        }

        None
    }
}
