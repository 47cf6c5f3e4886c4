//! Growable per-thread block storage, grown by handover rather than
//! in-place reallocation (spec.md §4.3 "Growth (handover)", §9).
//!
//! We use doubling-with-copy: each growth allocates a new, larger segment
//! and copies every block written so far into it, rather than a linked
//! list of equal-size segments. This keeps block indexing trivial (a block
//! index always resolves within the *current* segment, producer-side) at
//! the cost of an O(n) copy per growth, which is acceptable since growth is
//! geometric and therefore rare.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::block::Block;

/// Sentinel published on `writeblocks` meaning "follow `next`" (spec.md §3).
pub const HANDED_OVER: i64 = -1;

pub struct Segment {
    // SAFETY: only the producer thread that owns this segment ever pushes
    // into or mutates this `Vec`. The writer thread only reads indices it
    // has observed as published via `writeblocks` (acquire-load), which
    // happens-after the producer's matching release-store, per spec.md §5.
    blocks: UnsafeCell<Vec<Block>>,
    capacity: usize,
    writeblocks: AtomicI64,
    // SAFETY: written at most once, by the producer, strictly before the
    // `HANDED_OVER` release-store on `writeblocks`; read by the writer only
    // after observing that same store via an acquire-load.
    next: UnsafeCell<Option<Arc<Segment>>>,
}

// `Segment` is shared between exactly one producer thread and one writer
// thread; all access across that boundary is mediated by `writeblocks`.
unsafe impl Sync for Segment {}

impl Segment {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            blocks: UnsafeCell::new(Vec::with_capacity(capacity)),
            capacity,
            writeblocks: AtomicI64::new(0),
            next: UnsafeCell::new(None),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Producer-only mutable access.
    ///
    /// # Safety
    /// Caller must be the single producer thread that owns this segment.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn blocks_mut(&self) -> &mut Vec<Block> {
        &mut *self.blocks.get()
    }

    /// Read access to blocks at indices the writer has observed as published.
    ///
    /// # Safety
    /// Caller must only index entries `< writeblocks` as last observed via
    /// an acquire-load (or an index returned as unterminated and since
    /// re-published), per spec.md §5's ordering guarantee.
    pub unsafe fn blocks(&self) -> &Vec<Block> {
        &*self.blocks.get()
    }

    pub fn publish(&self, numblocks: usize) {
        self.writeblocks.store(numblocks as i64, Ordering::Release);
    }

    /// Producer-only: set the link to the successor segment. Must happen
    /// strictly before `publish_handover`.
    ///
    /// # Safety
    /// Caller must be the single producer thread.
    pub unsafe fn set_next(&self, next: Arc<Segment>) {
        *self.next.get() = Some(next);
    }

    pub fn publish_handover(&self) {
        self.writeblocks.store(HANDED_OVER, Ordering::Release);
    }

    pub fn load_writeblocks(&self) -> i64 {
        self.writeblocks.load(Ordering::Acquire)
    }

    /// Follows the handover link. Only valid to call after observing
    /// [`HANDED_OVER`] via [`Segment::load_writeblocks`].
    pub fn next(&self) -> Arc<Segment> {
        unsafe { &*self.next.get() }
            .clone()
            .expect("next segment must be set before publishing HANDED_OVER")
    }
}

#[cfg(test)]
mod test;
