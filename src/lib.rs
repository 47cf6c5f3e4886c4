//! Per-thread scoped-block profiler with a binary trace file format.
//!
//! Each instrumented OS thread pushes and pops labelled, located blocks
//! onto a lock-free buffer; a dedicated writer thread per attached thread
//! drains that buffer into its own `.trace` file, aggregating per-location
//! call statistics and a time-bucket index as it goes (see `DESIGN.md` for
//! the full format).
//!
//! ```no_run
//! use scope_trace::{session, fingerprinted_str};
//! use scope_trace::config::Config;
//!
//! session::init(Config::new("/tmp/myapp")).unwrap();
//! session::begin_thread("main").unwrap();
//!
//! {
//!     let _scope = scope_trace::recorder::scope::ScopedPop::new(
//!         fingerprinted_str!("update"),
//!         fingerprinted_str!("main.rs:1"),
//!     );
//!     // .. timed work ..
//! }
//!
//! session::write_blocks();
//! session::end_thread().unwrap();
//! session::shutdown().unwrap();
//! ```
//!
//! Disabling the `profiler-enabled` feature turns `push`/`pop` into no-ops
//! at compile time, for release builds that want the call sites to stay in
//! place without paying even the thread-local lookup.

pub mod block;
pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
mod ffi;
pub mod recorder;
pub mod session;
mod writer;

pub mod format;

pub use error::{Error, Result};
