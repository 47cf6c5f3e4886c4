//! RAII scope guards wrapping `push`/`pop` (spec.md §4.3 "Scoped helpers",
//! §9 "Scoped pop"). Mirrors the original source's `__TR_BLOCKS`/
//! `__TR_BLOCKPOP` pair: a function-level guard that knows how many of its
//! own pushes are still open, and closes whatever is left on scope exit
//! (including through an early return or an unwind).

use std::cell::Cell;

use crate::block::FingerprintedStr;
use crate::recorder;

/// Pops exactly one block when dropped.
#[must_use = "dropping this immediately pops the block it pushed"]
pub struct ScopedPop {
    armed: bool,
}

impl ScopedPop {
    pub fn new(label: FingerprintedStr, location: FingerprintedStr) -> Self {
        recorder::push(label, location);
        Self { armed: true }
    }

    /// Pops early, disarming the guard so `Drop` does not pop again.
    pub fn pop_now(mut self) {
        self.armed = false;
        recorder::pop();
    }
}

impl Drop for ScopedPop {
    fn drop(&mut self) {
        if self.armed {
            recorder::pop();
        }
    }
}

/// A function-scoped guard that tracks how many blocks it has pushed and
/// have not yet been individually popped; pops the rest on drop. Use this
/// when a thread routine may leave more than one block open at exit.
#[must_use = "dropping this immediately pops any blocks still open"]
pub struct ScopedPopN {
    open: Cell<usize>,
}

impl ScopedPopN {
    pub fn new() -> Self {
        Self { open: Cell::new(0) }
    }

    /// Pushes a nested block; the returned guard pops it (and decrements
    /// this scope's open count) whenever it is dropped.
    pub fn push(&self, label: FingerprintedStr, location: FingerprintedStr) -> NestedPop<'_> {
        recorder::push(label, location);
        self.open.set(self.open.get() + 1);
        NestedPop { owner: self }
    }
}

impl Default for ScopedPopN {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedPopN {
    fn drop(&mut self) {
        while self.open.get() > 0 {
            recorder::pop();
            self.open.set(self.open.get() - 1);
        }
    }
}

pub struct NestedPop<'a> {
    owner: &'a ScopedPopN,
}

impl Drop for NestedPop<'_> {
    fn drop(&mut self) {
        if self.owner.open.get() > 0 {
            recorder::pop();
            self.owner.open.set(self.owner.open.get() - 1);
        }
    }
}
