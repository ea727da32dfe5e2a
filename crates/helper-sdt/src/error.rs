//! Error types.
//!
//! Only failures detected locally have a type here. A native runtime that
//! rejects or drops a firing reports it through its own channel; this crate
//! never sees it.

use thiserror::Error;

pub use helper_sdt_abi::ArityError;

/// The native runtime binding could not be established.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("native probe module not found: {0}")]
    LibraryNotFound(String),

    #[error("failed to load native probe module: {0}")]
    Load(#[from] libloading::Error),

    #[error("failed to find symbol '{0}': {1}")]
    SymbolNotFound(String, libloading::Error),

    #[error("unknown probe backend '{0}' (expected sdt, library or record)")]
    UnknownBackend(String),

    #[error("probe binding already initialized")]
    AlreadyInitialized,
}

/// The current call stack could not be materialized.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    #[error("stack capture is not supported on this platform")]
    Unsupported,

    #[error("stack capture is disabled")]
    Disabled,
}

/// Any error surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Arity(#[from] ArityError),
}

pub type Result<T> = std::result::Result<T, Error>;
