//! In-memory representation of a single timing block (spec.md §3).

use std::ffi::CStr;

use crate::fingerprint::crc32_const;

/// A compile-time-fingerprinted string: a label or a source location.
///
/// Mirrors `trace_crcstr_t` in the original source: a borrowed,
/// `'static` C string plus its CRC, computed once at compile time via
/// [`crc32_const`] so `push` never hashes anything.
#[derive(Clone, Copy, Debug, Eq)]
pub struct FingerprintedStr {
    pub str: &'static CStr,
    pub crc: u32,
}

impl FingerprintedStr {
    /// Builds from a NUL-terminated `&'static str` (as produced by the
    /// [`fingerprinted_str!`] macro). The CRC is taken over the content
    /// excluding the trailing NUL, so it matches [`crate::fingerprint::crc32`]
    /// run over a runtime byte sequence with no NUL of its own.
    pub const fn new(nul_terminated: &'static str) -> Self {
        let bytes = nul_terminated.as_bytes();
        // Exclude the trailing NUL from the fingerprinted content.
        let content_len = bytes.len() - 1;
        let crc = crc32_const(split_before_nul(bytes, content_len));
        Self {
            str: unsafe { CStr::from_bytes_with_nul_unchecked(bytes) },
            crc,
        }
    }
}

/// `const fn` slice of the first `len` bytes, since `&bytes[..len]` is not
/// usable in a `const fn` on our MSRV without the `slice::split_at` const API.
const fn split_before_nul(bytes: &'static [u8], len: usize) -> &'static [u8] {
    let (content, _) = bytes.split_at(len);
    content
}

impl PartialEq for FingerprintedStr {
    fn eq(&self, other: &Self) -> bool {
        self.crc == other.crc
    }
}

impl PartialOrd for FingerprintedStr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FingerprintedStr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.crc.cmp(&other.crc)
    }
}

/// Builds a [`FingerprintedStr`] from a string literal, appending the NUL
/// terminator the literal needs to double as a `&'static CStr`.
#[macro_export]
macro_rules! fingerprinted_str {
    ($s:expr) => {{
        const S: &str = concat!($s, "\0");
        $crate::block::FingerprintedStr::new(S)
    }};
}

/// An optional runtime tag attached to one specific block. Fingerprinted
/// lazily, by the writer, only if the block is ever drained (spec.md §3).
#[derive(Clone, Debug)]
pub struct RuntimeTag(std::ffi::CString);

impl RuntimeTag {
    pub fn new(s: impl Into<Vec<u8>>) -> Option<Self> {
        std::ffi::CString::new(s).ok().map(Self)
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }
}

/// One scoped timing span, as it lives in a thread's buffer.
///
/// `end == 0` means "still open" (spec.md §3). The producer never mutates a
/// block's `start`/`end`/`parent`/`label`/`location` after `end` is written;
/// only the writer's rewrite pass (§4.4.7) touches a block after that point,
/// and only to re-derive `end_micros`/`child_time` for the file record.
#[derive(Clone)]
pub struct Block {
    pub label: FingerprintedStr,
    pub location: FingerprintedStr,
    pub tag: Option<RuntimeTag>,
    pub start: u64,
    pub end: u64,
    pub parent: i64,
    /// Accumulated microsecond duration of direct children that have closed.
    pub child_time: u64,
}

impl Block {
    pub fn open(label: FingerprintedStr, location: FingerprintedStr, parent: i64, start: u64) -> Self {
        Self {
            label,
            location,
            tag: None,
            start,
            end: 0,
            parent,
            child_time: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end == 0
    }
}

#[cfg(test)]
mod test;
