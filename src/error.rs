use thiserror::Error;

/// Errors returned by the public, non-hot-path entry points.
///
/// `push`/`pop` never return `Result`: capacity is handled by growth, and
/// any other misuse there is a programmer error that is asserted away in
/// debug builds instead (see spec.md §7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("session already initialized")]
    AlreadyInitialized,

    #[error("session not initialized")]
    NotInitialized,

    #[error("clock already calibrated")]
    AlreadyCalibrated,

    #[error("no thread attached to the current OS thread")]
    NoAttachedThread,

    #[error("a thread is already attached to the current OS thread")]
    ThreadAlreadyAttached,

    #[error("end_thread called with {open} block(s) still open")]
    OpenBlocksOnThreadEnd { open: usize },

    #[error("failed to open trace file {path}")]
    OpenTraceFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
