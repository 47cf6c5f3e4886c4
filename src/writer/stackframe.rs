//! Stack-frame aggregation table (spec.md §4.4 "Stack-frame aggregation",
//! §6 "Stack-frame table").

use std::collections::HashMap;

use crate::format::StackFrameRecord;

/// Frames are keyed by `location.crc`, not `label.crc`: two differently
/// named blocks opened from the same source location aggregate together,
/// matching `TraceProfiler.cpp`'s `stackframe = block.location.crc`.
pub struct StackFrameTable {
    by_crc: HashMap<u32, StackFrameRecord>,
}

impl StackFrameTable {
    pub fn new() -> Self {
        Self { by_crc: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.by_crc.len()
    }

    /// Records one completed call. Creates the frame on first sight, with
    /// `best_call`/`worst_call` seeded from that first call rather than a
    /// sentinel duration, matching the original's unconditional
    /// `frame.bestCallTime = frame.wallTime` on creation.
    pub fn record_call(
        &mut self,
        location_crc: u32,
        label: &[u8],
        location: &[u8],
        wall_time: u64,
        child_time: u64,
        block_index: i32,
    ) {
        let frame = self
            .by_crc
            .entry(location_crc)
            .or_insert_with(|| StackFrameRecord::new(label, location));

        frame.call_count += 1;
        frame.wall_time += wall_time;
        frame.child_time += child_time;

        if frame.best_call < 0 || wall_time < frame.best_call_time {
            frame.best_call_time = wall_time;
            frame.best_call = block_index;
        }
        if frame.worst_call < 0 || wall_time > frame.worst_call_time {
            frame.worst_call_time = wall_time;
            frame.worst_call = block_index;
        }
    }

    /// Consumes the table, returning `(fingerprint, record)` pairs sorted
    /// ascending by fingerprint (spec.md §6: the stack-frame table is a
    /// parallel `stack_ids`/`stack_frames` pair, both sorted by CRC, so a
    /// reader can binary-search the ids array).
    pub fn into_sorted_records(self) -> Vec<(u32, StackFrameRecord)> {
        let mut entries: Vec<(u32, StackFrameRecord)> = self.by_crc.into_iter().collect();
        entries.sort_unstable_by_key(|(crc, _)| *crc);
        entries
    }
}

#[cfg(test)]
mod test;
