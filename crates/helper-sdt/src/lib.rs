//! Static tracepoint shim.
//!
//! [`ProbeSurface`] fires `helper_sdt` tracepoints with 0 to 10 arguments
//! under either probe ABI version, and retires rule names once a group of
//! firings is complete. [`BacktraceEmitter`] turns the current call stack
//! into one frame firing per rendered line.
//!
//! The native tracer runtime is reached through a [`ProbeBinding`]: static
//! USDT probes in this process, a native module loaded from disk, or an
//! in-memory recorder.
//!
//! ```
//! use helper_sdt::{AbiVersion, ProbeArg, ProbeSurface, RecordingBinding, RuleName};
//!
//! let surface = ProbeSurface::new(RecordingBinding::new());
//! let rule = RuleName::from("cache.miss");
//! surface.fire(AbiVersion::V31, &rule, [ProbeArg::from(42_u32), ProbeArg::from("key")]);
//! let frames = surface.emit_backtrace(&rule).unwrap();
//! surface.retire(&rule);
//! assert!(frames > 0);
//! ```

mod backtrace;
pub mod binding;
mod config;
mod error;
mod global;
pub mod metrics;
mod surface;

pub use backtrace::{
    BacktraceEmitter, FixedCapture, FrameRecord, StackCapture, StdCapture, split_frames,
};
pub use binding::{Firing, LibraryBinding, ProbeBinding, RecordingBinding, SdtBinding};
pub use config::{
    Backend, BindingConfig, ENV_BACKEND, ENV_LIBRARY, ENV_PATH, host_arch, jvm_arch,
};
pub use error::{ArityError, BindingError, CaptureError, Error, Result};
pub use global::{global, init, init_from_env, install};
pub use helper_sdt_abi::{
    AbiVersion, Arity, EntryPoint, LoweredArgs, MAX_ARITY, PROVIDER, ParseAbiVersionError,
    ProbeArg, ProbeSite, RuleName,
};
pub use surface::ProbeSurface;
