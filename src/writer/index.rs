//! Sparse time-bucket index (spec.md §4.4 "Time-bucket index", §6 "Time
//! index").
//!
//! Bucket `b` covers the half-open range `[b * BUCKET_WIDTH_MICROS, (b + 1)
//! * BUCKET_WIDTH_MICROS)` of session-relative microseconds and lists every
//! block whose `[start, end)` interval intersects it, so a viewer can seek
//! to a timestamp and scan only the blocks live around it instead of the
//! whole file.

const BUCKET_WIDTH_MICROS: u64 = 1_000_000;

pub struct TimeIndex {
    buckets: Vec<Vec<u32>>,
}

impl TimeIndex {
    pub fn new() -> Self {
        Self { buckets: Vec::new() }
    }

    /// Inserts `block_index` into every bucket its `[start_micros,
    /// end_micros)` interval intersects. Only called once a block's `end`
    /// is known: blocks still open when first streamed are skipped here and
    /// inserted later, once closed, by the writer's rewrite pass (spec.md
    /// §4.4 point 7).
    pub fn observe(&mut self, start_micros: u64, end_micros: u64, block_index: u32) {
        let first = (start_micros / BUCKET_WIDTH_MICROS) as usize;
        let last_micro = end_micros.saturating_sub(1).max(start_micros);
        let last = (last_micro / BUCKET_WIDTH_MICROS) as usize;
        if self.buckets.len() <= last {
            self.buckets.resize_with(last + 1, Vec::new);
        }
        for bucket in &mut self.buckets[first..=last] {
            bucket.push(block_index);
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Sorts every bucket ascending (spec.md §4.4 point 8, "tail sort").
    /// Entries are appended unsorted during streaming because a rewritten
    /// block's index can be smaller than indices already appended to the
    /// same bucket by blocks streamed after it.
    pub fn sort(&mut self) {
        for bucket in &mut self.buckets {
            bucket.sort_unstable();
        }
    }

    pub fn into_buckets(self) -> Vec<Vec<u32>> {
        self.buckets
    }
}

#[cfg(test)]
mod test;
