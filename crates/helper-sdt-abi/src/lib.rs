//! Probe ABI vocabulary for helper-sdt.
//!
//! The native tracer runtime exposes a fixed, numbered set of entry points:
//! one per argument count (0 through 10), duplicated for each supported ABI
//! generation, plus a backtrace-frame entry and a retire entry. This crate
//! names that table and defines how typed probe arguments are lowered to the
//! machine words those entry points take.

mod arg;
mod rule;
mod site;
mod version;

pub use arg::{LoweredArgs, ProbeArg, nul_terminated};
pub use rule::RuleName;
pub use site::{EntryPoint, PROVIDER, ProbeSite};
pub use version::{AbiVersion, Arity, MAX_ARITY, ParseAbiVersionError};

use thiserror::Error;

/// Argument list does not fit any fixed-arity entry point.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityError {
    #[error("too many probe arguments: {count} (at most {MAX_ARITY} supported)")]
    TooMany { count: usize },
}
