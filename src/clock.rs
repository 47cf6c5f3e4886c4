//! Calibrates the process-wide mapping from tick-counter units to
//! microseconds, and converts raw tick values to microseconds relative to
//! the session epoch (spec.md §4.1).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::ffi::syscall;

const CALIBRATION_WINDOW_MICROS: u64 = 100_000;

/// Process-wide clock state. There is exactly one of these, owned by
/// [`crate::session::Session`]; `calibrate` asserts it only runs once.
pub struct Clock {
    ticks_per_micro: AtomicU64,
    tsc_start: AtomicU64,
    micro_start: AtomicU64,
    calibrated: std::sync::atomic::AtomicBool,
}

impl Clock {
    pub const fn uninit() -> Self {
        Self {
            ticks_per_micro: AtomicU64::new(0),
            tsc_start: AtomicU64::new(0),
            micro_start: AtomicU64::new(0),
            calibrated: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Busy-waits at least 100ms sampling both the tick counter and the
    /// wall clock, then derives `ticks_per_micro`. Must run exactly once.
    pub fn calibrate(&self) -> Result<()> {
        if self.calibrated.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyCalibrated);
        }

        let tsc_start = syscall::read_tick_counter();
        let micro_start = syscall::wall_micros()?;

        let (tsc_end, micro_end) = loop {
            let tsc_end = syscall::read_tick_counter();
            let micro_end = syscall::wall_micros()?;
            if micro_end - micro_start >= CALIBRATION_WINDOW_MICROS {
                break (tsc_end, micro_end);
            }
            std::hint::spin_loop();
        };

        let ticks_per_micro = (tsc_end - tsc_start) / (micro_end - micro_start).max(1);
        self.ticks_per_micro
            .store(ticks_per_micro.max(1), Ordering::Relaxed);

        // The epoch basis is resampled after the busy-wait, not the one
        // taken before it, so relative_micros(tsc_start) == 0 exactly.
        let tsc_start = syscall::read_tick_counter();
        let micro_start = syscall::wall_micros()?;
        self.tsc_start.store(tsc_start, Ordering::Relaxed);
        self.micro_start.store(micro_start, Ordering::Relaxed);

        log::info!(
            "scope-trace clock calibrated: {} ticks/us",
            ticks_per_micro.max(1)
        );
        Ok(())
    }

    /// Converts a raw tick value into microseconds relative to the session epoch.
    #[inline]
    pub fn relative_micros(&self, tsc: u64) -> u64 {
        let start = self.tsc_start.load(Ordering::Relaxed);
        let ticks_per_micro = self.ticks_per_micro.load(Ordering::Relaxed).max(1);
        tsc.saturating_sub(start) / ticks_per_micro
    }

    /// Microseconds, relative to the session epoch, of "now".
    pub fn now_relative_micros(&self) -> Result<u64> {
        Ok(self.relative_micros(syscall::read_tick_counter()))
    }

    /// Raw tick reading, for the hot `push`/`pop` path.
    #[inline(always)]
    pub fn now_ticks(&self) -> u64 {
        syscall::read_tick_counter()
    }

    pub fn session_epoch_micros(&self) -> u64 {
        self.micro_start.load(Ordering::Relaxed)
    }
}
