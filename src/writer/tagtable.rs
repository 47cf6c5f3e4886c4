//! Runtime tag table (spec.md §4.4 "Tag interning", §6 "Tag table").
//!
//! Tags are interned lazily by the writer, not the producer: `set_tag`
//! stores the raw `CString` on the block, and fingerprinting only happens
//! once a block is actually drained, so an application that never reads
//! back a tagged block never pays the hashing cost outside the hot path.

use std::collections::HashMap;

use crate::fingerprint::crc32;
use crate::format::{nul_pad, STRING_FIELD_LEN};

pub struct TagTable {
    by_crc: HashMap<u32, [u8; STRING_FIELD_LEN]>,
}

impl TagTable {
    pub fn new() -> Self {
        Self { by_crc: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.by_crc.len()
    }

    /// Interns a tag string, returning its fingerprint. Idempotent.
    pub fn intern(&mut self, tag: &[u8]) -> u32 {
        let crc = crc32(tag);
        self.by_crc.entry(crc).or_insert_with(|| nul_pad(tag));
        crc
    }

    /// Consumes the table, returning `(fingerprint, bytes)` pairs sorted
    /// ascending by fingerprint (spec.md §6: parallel `tag_ids`/`tags`
    /// arrays, both sorted by CRC).
    pub fn into_sorted_records(self) -> Vec<(u32, [u8; STRING_FIELD_LEN])> {
        let mut entries: Vec<(u32, [u8; STRING_FIELD_LEN])> = self.by_crc.into_iter().collect();
        entries.sort_unstable_by_key(|(crc, _)| *crc);
        entries
    }
}

#[cfg(test)]
mod test;
