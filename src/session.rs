//! Process-wide session lifecycle (spec.md §4.5 "Session lifecycle", §5
//! "Concurrency & Resource Model").
//!
//! There is exactly one [`Session`] per process, created by [`init`] and
//! torn down by [`shutdown`]. The only lock in the whole crate lives here,
//! and it guards nothing but the list of writer-thread handles: everything
//! else is either thread-local ([`crate::recorder`]) or synchronized
//! through the single `writeblocks` atomic per segment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread::JoinHandle;

use crate::clock::Clock;
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::recorder;
use crate::writer;

struct Session {
    clock: std::sync::Arc<Clock>,
    config: Config,
    next_thread_id: AtomicU64,
    generation: AtomicU64,
    writer_handles: Mutex<Vec<JoinHandle<Result<()>>>>,
}

static SESSION: OnceLock<Session> = OnceLock::new();

fn session() -> Result<&'static Session> {
    SESSION.get().ok_or(Error::NotInitialized)
}

/// Initializes the process-wide session: calibrates the clock once and
/// records `config` for every subsequent [`begin_thread`]. Must be called
/// exactly once per process, before any thread attaches.
pub fn init(config: Config) -> Result<()> {
    if SESSION.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }
    let clock = std::sync::Arc::new(Clock::uninit());
    clock.calibrate()?;
    let session = Session {
        clock,
        config,
        next_thread_id: AtomicU64::new(1),
        generation: AtomicU64::new(0),
        writer_handles: Mutex::new(Vec::new()),
    };
    SESSION
        .set(session)
        .map_err(|_| Error::AlreadyInitialized)?;
    Ok(())
}

/// Attaches the current OS thread, starting a dedicated writer thread for
/// it. The thread name is truncated to [`config::MAX_THREAD_NAME_LEN`]
/// bytes and folded into its trace file's path.
pub fn begin_thread(name: &str) -> Result<()> {
    let session = session()?;
    let name = config::truncate_thread_name(name, config::MAX_THREAD_NAME_LEN).to_string();
    let thread_id = session.next_thread_id.fetch_add(1, Ordering::Relaxed);

    let channel = recorder::attach(thread_id, std::sync::Arc::clone(&session.clock), session.config.initial_capacity)?;
    let handle = writer::spawn(channel, session.config.clone(), name, thread_id);

    session
        .writer_handles
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(handle);
    Ok(())
}

/// Detaches the current OS thread. Fails if any block is still open.
pub fn end_thread() -> Result<()> {
    recorder::detach()
}

/// Publishes every attached thread's buffered blocks to its writer. Safe
/// to call from any thread; it only touches the calling thread's own
/// buffer (spec.md §4.3 "Periodic flush").
pub fn write_blocks() {
    let generation = match SESSION.get() {
        Some(session) => session.generation.fetch_add(1, Ordering::Relaxed),
        None => return,
    };
    recorder::write_blocks(generation);
}

/// Truncates the calling thread's buffer back to its currently open call
/// stack, reclaiming everything already closed (spec.md §4.3 "reset"). A
/// no-op on an empty stack. See [`recorder::reset`] for the caveats around
/// writer coordination and segment growth.
pub fn reset() {
    let generation = match SESSION.get() {
        Some(session) => session.generation.fetch_add(1, Ordering::Relaxed),
        None => return,
    };
    recorder::reset(generation);
}

/// Waits for every writer thread spawned so far to finish draining and
/// close its trace file. Returns the first writer error encountered, if
/// any, after joining every handle.
pub fn shutdown() -> Result<()> {
    let session = session()?;
    let handles = std::mem::take(
        &mut *session
            .writer_handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()),
    );

    let mut first_error = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log::error!("scope-trace writer failed: {err}");
                first_error.get_or_insert(err);
            }
            Err(panic) => {
                log::error!("scope-trace writer thread panicked: {panic:?}");
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
