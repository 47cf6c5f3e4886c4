//! Process-wide and per-session configuration (spec.md §6 "Configuration").

use std::path::PathBuf;

/// 4,194,345 blocks rounded up to a whole number of 4KiB pages, matching the
/// example capacity spec.md §6 gives for `record-size`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4_194_345;

/// Options for [`crate::session::Session::init`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Trace files are written to `<base_path>.<thread_name>.<thread_id>.trace`.
    pub base_path: PathBuf,

    /// Initial per-buffer capacity, in blocks. Grows by handover (spec.md §4.3)
    /// once exceeded; never shrinks.
    pub initial_capacity: usize,
}

impl Config {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub(crate) fn trace_path(&self, thread_name: &str, thread_id: u64) -> PathBuf {
        let base = self.base_path.to_string_lossy();
        PathBuf::from(format!("{base}.{thread_name}.{thread_id}.trace"))
    }
}

/// Truncates a thread name to the longest prefix that fits in `max_len`
/// bytes, cutting on a UTF-8 boundary. Grounded in `original_source`'s fixed
/// `path[1024]` buffer: the original guards against a name blowing past the
/// trace path buffer; we guard the same failure mode without a fixed-size
/// buffer of our own.
pub(crate) fn truncate_thread_name(name: &str, max_len: usize) -> &str {
    if name.len() <= max_len {
        return name;
    }
    let mut end = max_len;
    while end > 0 && !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

pub(crate) const MAX_THREAD_NAME_LEN: usize = 63;

#[cfg(test)]
mod test;
