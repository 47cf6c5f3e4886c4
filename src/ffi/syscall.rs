use std::io::{Error, Result};
use std::mem::MaybeUninit;

/// Reads the fastest available monotonic tick counter.
///
/// On `x86_64`/`x86` this is `rdtsc`, a handful of cycles and no syscall.
/// On other architectures there is no portable equivalent instruction, so we
/// fall back to `clock_gettime(CLOCK_MONOTONIC, ..)` reinterpreted as a tick
/// count at nanosecond granularity; [`crate::clock::Clock::calibrate`]
/// computes `ticks_per_micro` from whichever source is compiled in, so
/// callers never need to know which one is active.
#[inline(always)]
pub fn read_tick_counter() -> u64 {
    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::_rdtsc()
        }
        #[cfg(target_arch = "x86")]
        unsafe {
            core::arch::x86::_rdtsc()
        }
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
    {
        monotonic_nanos()
    }
}

/// Wall-clock microseconds since the Unix epoch, via `clock_gettime(CLOCK_REALTIME, ..)`.
pub fn wall_micros() -> Result<u64> {
    let mut ts = MaybeUninit::<libc::timespec>::uninit();
    let result = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, ts.as_mut_ptr()) };
    if result != 0 {
        return Err(Error::last_os_error());
    }
    let ts = unsafe { ts.assume_init() };
    Ok(ts.tv_sec as u64 * 1_000_000 + ts.tv_nsec as u64 / 1_000)
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
fn monotonic_nanos() -> u64 {
    let mut ts = MaybeUninit::<libc::timespec>::uninit();
    let result = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, ts.as_mut_ptr()) };
    if result != 0 {
        return 0;
    }
    let ts = unsafe { ts.assume_init() };
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}
