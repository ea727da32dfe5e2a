//! Bindings to the native tracer runtime.
//!
//! A [`ProbeBinding`] is the whole call contract into the runtime: one call
//! per firing, no return channel. Three implementations exist:
//!
//! - [`SdtBinding`]: static USDT tracepoints compiled into this process.
//! - [`LibraryBinding`]: entry points resolved from a native module at load time.
//! - [`RecordingBinding`]: keeps every firing in memory.

mod library;
mod recording;
mod sdt;

pub use library::LibraryBinding;
pub use recording::{Firing, RecordingBinding};
pub use sdt::SdtBinding;

use helper_sdt_abi::{ProbeArg, ProbeSite, RuleName};

/// Fire-and-forget call contract into the native tracer runtime.
///
/// Callers guarantee `args.len() == site.arity().count()`. Implementations
/// must not block and must not validate argument values; a runtime that
/// rejects a firing drops it silently.
pub trait ProbeBinding: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fire the probe entry point for `site`.
    fn fire(&self, site: ProbeSite, rule: &RuleName, args: &[ProbeArg<'_>]);

    /// Fire the backtrace-frame entry point with one rendered stack line.
    fn fire_frame(&self, rule: &RuleName, line: &str, ordinal: usize);

    /// Release tracer-side resources associated with `rule`.
    fn retire(&self, rule: &RuleName);
}
