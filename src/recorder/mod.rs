//! The per-thread block recorder: lock-free append, scoped push/pop, and
//! growable storage (spec.md §4.3).
//!
//! Every instrumented OS thread owns exactly one [`Recorder`], reached
//! through thread-local storage, so `push`/`pop` take no explicit handle.
//! [`crate::session`] is the only caller of [`attach`]/[`detach`].

pub mod buffer;
pub mod scope;

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use buffer::Segment;

use crate::block::{Block, FingerprintedStr, RuntimeTag};
use crate::clock::Clock;
use crate::error::{Error, Result};

/// Shared, thread-lifetime state handed from the producer to its writer at
/// `begin_thread`. Outlives every individual [`Segment`] in the chain.
pub(crate) struct ThreadChannel {
    pub id: u64,
    pub clock: Arc<Clock>,
    // SAFETY: written by the producer in `attach` and, later, by `reset`;
    // read by the writer only after it has observed `terminated` via an
    // `Acquire` load, by which point the producer has stopped touching it.
    pub(crate) micro_start: std::cell::UnsafeCell<u64>,
    // SAFETY: written once by the producer in `detach`, strictly before the
    // `Release` store to `terminated`; read by the writer only after it has
    // observed `terminated` via an `Acquire` load.
    pub(crate) micro_end: std::cell::UnsafeCell<u64>,
    pub(crate) terminated: AtomicBool,
    pub first_segment: Arc<Segment>,
}

unsafe impl Sync for ThreadChannel {}

impl ThreadChannel {
    pub(crate) fn new(id: u64, clock: Arc<Clock>, micro_start: u64, first_segment: Arc<Segment>) -> Arc<Self> {
        Arc::new(Self {
            id,
            clock,
            micro_start: std::cell::UnsafeCell::new(micro_start),
            micro_end: std::cell::UnsafeCell::new(0),
            terminated: AtomicBool::new(false),
            first_segment,
        })
    }

    /// # Safety
    /// Caller must be the producer thread that owns this channel.
    pub(crate) unsafe fn mark_terminated(&self, micro_end: u64) {
        *self.micro_end.get() = micro_end;
        self.terminated.store(true, Ordering::Release);
    }

    /// # Safety
    /// Caller must be the producer thread that owns this channel.
    unsafe fn set_micro_start(&self, micro_start: u64) {
        *self.micro_start.get() = micro_start;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Valid only after [`ThreadChannel::is_terminated`] observed `true`.
    pub fn micro_start(&self) -> u64 {
        unsafe { *self.micro_start.get() }
    }

    /// Valid only after [`ThreadChannel::is_terminated`] observed `true`.
    pub fn micro_end(&self) -> u64 {
        unsafe { *self.micro_end.get() }
    }
}

/// Producer-side state for one thread's block buffer (spec.md §3 "Thread
/// record").
struct Recorder {
    numblocks: usize,
    maxblocks: usize,
    /// Index of the top open block, `-1` if empty, `-2` once ended.
    stack: i64,
    segment: Arc<Segment>,
    reset_gen: u64,
    channel: Arc<ThreadChannel>,
}

thread_local! {
    static CURRENT: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

/// Attaches the current OS thread; returns the channel the caller should
/// hand to a freshly spawned writer thread.
pub(crate) fn attach(id: u64, clock: Arc<Clock>, initial_capacity: usize) -> Result<Arc<ThreadChannel>> {
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return Err(Error::ThreadAlreadyAttached);
        }
        let micro_start = clock.now_relative_micros()?;
        let segment = Segment::new(initial_capacity);
        let channel = ThreadChannel::new(id, clock, micro_start, Arc::clone(&segment));
        *slot = Some(Recorder {
            numblocks: 0,
            maxblocks: initial_capacity,
            stack: -1,
            segment,
            reset_gen: 0,
            channel: Arc::clone(&channel),
        });
        Ok(channel)
    })
}

/// Detaches the current thread. Requires no open blocks.
pub(crate) fn detach() -> Result<()> {
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        let recorder = slot.as_mut().ok_or(Error::NoAttachedThread)?;
        if recorder.stack != -1 {
            let open = open_block_count(recorder);
            return Err(Error::OpenBlocksOnThreadEnd { open });
        }
        let micro_end = recorder.channel.clock.now_relative_micros()?;
        recorder.stack = -2;
        // SAFETY: called from the producer thread that owns this channel.
        unsafe { recorder.channel.mark_terminated(micro_end) };
        recorder.segment.publish(recorder.numblocks);
        *slot = None;
        Ok(())
    })
}

fn open_block_count(recorder: &Recorder) -> usize {
    let blocks = unsafe { recorder.segment.blocks() };
    let mut depth = 0;
    let mut cur = recorder.stack;
    while cur >= 0 {
        depth += 1;
        cur = blocks[cur as usize].parent;
    }
    depth
}

/// Appends a new open block as a child of the current top-of-stack.
///
/// No-op (besides a debug assertion) if no thread is attached: `push`/`pop`
/// never branch on error conditions beyond capacity (spec.md §7).
#[cfg_attr(feature = "inline-hotpath", inline(always))]
pub fn push(label: FingerprintedStr, location: FingerprintedStr) {
    #[cfg(not(feature = "profiler-enabled"))]
    {
        let _ = (label, location);
        return;
    }
    #[cfg(feature = "profiler-enabled")]
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        let recorder = match slot.as_mut() {
            Some(r) => r,
            None => {
                debug_assert!(false, "push called with no thread attached");
                return;
            }
        };

        if recorder.numblocks + 1 > recorder.maxblocks {
            grow(recorder);
        }

        let start = recorder.channel.clock.now_ticks();
        let index = recorder.numblocks;
        let block = Block::open(label, location, recorder.stack, start);
        // SAFETY: producer-only mutation of the current segment.
        unsafe { recorder.segment.blocks_mut() }.push(block);
        recorder.numblocks = index + 1;
        recorder.stack = index as i64;
    });
}

/// Closes the current top-of-stack block.
#[cfg_attr(feature = "inline-hotpath", inline(always))]
pub fn pop() {
    #[cfg(not(feature = "profiler-enabled"))]
    return;
    #[cfg(feature = "profiler-enabled")]
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        let recorder = match slot.as_mut() {
            Some(r) => r,
            None => {
                debug_assert!(false, "pop called with no thread attached");
                return;
            }
        };
        if recorder.stack < 0 {
            debug_assert!(false, "pop called on an empty block stack");
            return;
        }

        let end = recorder.channel.clock.now_ticks();
        let stack = recorder.stack as usize;
        let clock = Arc::clone(&recorder.channel.clock);
        // SAFETY: producer-only mutation of the current segment.
        let blocks = unsafe { recorder.segment.blocks_mut() };
        blocks[stack].end = end;
        let parent = blocks[stack].parent;
        if parent != -1 {
            let duration_micros = clock.relative_micros(end) - clock.relative_micros(blocks[stack].start);
            blocks[parent as usize].child_time += duration_micros;
        }
        recorder.stack = parent;
    });
}

/// Attaches a runtime tag to the currently open (top-of-stack) block.
pub fn set_tag(tag: RuntimeTag) {
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(recorder) = slot.as_mut() {
            if recorder.stack >= 0 {
                let blocks = unsafe { recorder.segment.blocks_mut() };
                blocks[recorder.stack as usize].tag = Some(tag);
            }
        }
    });
}

/// Publishes the current `numblocks` to the writer.
pub fn write_blocks(generation: u64) {
    CURRENT.with(|cell| {
        let slot = cell.borrow();
        if let Some(recorder) = slot.as_ref() {
            if recorder.reset_gen <= generation {
                recorder.segment.publish(recorder.numblocks);
            }
        }
    });
}

/// Truncates the buffer back to the currently open call stack, so a thread
/// that never returns to an empty stack (e.g. a long-lived event loop) can
/// still reclaim memory periodically (spec.md §4.3 "reset").
///
/// A no-op on an empty stack: there is nothing to preserve, and a caller
/// wanting to discard everything should let the stack drain naturally
/// instead. Also a no-op once the recorder has grown past its base
/// segment, since the writer may already be mid-drain of an earlier
/// segment and has no way to learn that its blocks were just renumbered
/// out from under it (spec.md §9 "Reset"; §4.4 growth/reset interaction).
/// The writer observes monotonic block counts, so calling this before the
/// writer has caught up to the current `numblocks` loses the blocks in
/// between; that race is the caller's responsibility to avoid.
pub fn reset(generation: u64) {
    CURRENT.with(|cell| {
        let mut slot = cell.borrow_mut();
        let recorder = match slot.as_mut() {
            Some(r) => r,
            None => return,
        };
        if recorder.stack < 0 {
            return;
        }
        if recorder.reset_gen >= generation {
            return;
        }
        if has_grown(recorder) {
            return;
        }

        let now = match recorder.channel.clock.now_relative_micros() {
            Ok(now) => now,
            Err(_) => return,
        };

        recorder.reset_gen = generation;
        let top = recorder.stack as usize;
        // SAFETY: producer-only mutation of the current segment.
        let blocks = unsafe { recorder.segment.blocks_mut() };
        blocks.truncate(top + 1);
        blocks[top].child_time = 0;
        recorder.numblocks = top + 1;
        // SAFETY: called from the producer thread that owns this channel.
        unsafe { recorder.channel.set_micro_start(now) };
        recorder.segment.publish(recorder.numblocks);
    });
}

/// Whether the recorder has handed its base segment over to a larger one.
fn has_grown(recorder: &Recorder) -> bool {
    !Arc::ptr_eq(&recorder.segment, &recorder.channel.first_segment)
}

/// Doubles capacity and hands the old segment over to the writer.
fn grow(recorder: &mut Recorder) {
    let new_capacity = recorder.maxblocks * 2;
    let new_segment = Segment::new(new_capacity);
    // SAFETY: producer-only access to both the old and new segment.
    unsafe {
        let copy_from = recorder.segment.blocks();
        new_segment.blocks_mut().extend_from_slice(&copy_from[..recorder.numblocks]);
        recorder.segment.set_next(Arc::clone(&new_segment));
    }
    recorder.segment.publish_handover();
    recorder.segment = new_segment;
    recorder.maxblocks = new_capacity;
}

#[cfg(test)]
mod test;
