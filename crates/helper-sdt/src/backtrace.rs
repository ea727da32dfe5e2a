//! Backtrace decomposition.
//!
//! A captured stack is rendered to text, split into lines and fired one line
//! at a time through the 2-argument frame entry point. The rendered capture
//! includes the emitter's own frames: the capture reflects the point where
//! [`BacktraceEmitter::emit`] was invoked, not its caller.

use std::backtrace::{Backtrace, BacktraceStatus};

use helper_sdt_abi::RuleName;
use tracing::{debug, trace};

use crate::surface::ProbeSurface;
use crate::{CaptureError, metrics};

/// Source of a rendered call stack.
pub trait StackCapture {
    fn capture(&self) -> Result<String, CaptureError>;
}

impl<F> StackCapture for F
where
    F: Fn() -> Result<String, CaptureError>,
{
    fn capture(&self) -> Result<String, CaptureError> {
        self()
    }
}

/// Capture of the current thread's stack via [`std::backtrace`].
///
/// Captures regardless of `RUST_BACKTRACE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdCapture;

impl StackCapture for StdCapture {
    #[inline(never)]
    fn capture(&self) -> Result<String, CaptureError> {
        let backtrace = Backtrace::force_capture();
        match backtrace.status() {
            BacktraceStatus::Captured => Ok(backtrace.to_string()),
            BacktraceStatus::Disabled => Err(CaptureError::Disabled),
            _ => Err(CaptureError::Unsupported),
        }
    }
}

/// Pre-rendered capture, replayed on every call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedCapture {
    text: String,
}

impl FixedCapture {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// One line per item, joined with `'\n'`.
    #[must_use]
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect();
        Self::new(lines.join("\n"))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl StackCapture for FixedCapture {
    fn capture(&self) -> Result<String, CaptureError> {
        Ok(self.text.clone())
    }
}

/// One line of a rendered capture and its position from the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRecord<'a> {
    pub ordinal: usize,
    pub text: &'a str,
}

/// Split a rendered capture into frame records.
///
/// Lines are separated by `'\n'` only; a `'\r'` stays part of its line.
/// Trailing empty lines are dropped, interior ones are kept.
#[must_use]
pub fn split_frames(rendered: &str) -> Vec<FrameRecord<'_>> {
    let mut lines: Vec<&str> = rendered.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| FrameRecord { ordinal, text })
        .collect()
}

/// Fires one frame event per line of a stack capture.
#[derive(Clone, Debug)]
pub struct BacktraceEmitter<C = StdCapture> {
    surface: ProbeSurface,
    capture: C,
}

impl BacktraceEmitter {
    #[must_use]
    pub const fn new(surface: ProbeSurface) -> Self {
        Self {
            surface,
            capture: StdCapture,
        }
    }
}

impl<C: StackCapture> BacktraceEmitter<C> {
    #[must_use]
    pub const fn with_capture(surface: ProbeSurface, capture: C) -> Self {
        Self { surface, capture }
    }

    #[must_use]
    pub const fn surface(&self) -> &ProbeSurface {
        &self.surface
    }

    /// Capture the stack and fire `(rule, line, ordinal)` for every line,
    /// top to bottom, ordinals starting at 0.
    ///
    /// Returns the number of frames fired. The rule is not retired; call
    /// [`ProbeSurface::retire`] once the caller is done with it.
    ///
    /// # Errors
    ///
    /// A failed capture fires nothing and is returned as is.
    #[inline(never)]
    pub fn emit(&self, rule: &RuleName) -> Result<usize, CaptureError> {
        let rendered = self.capture.capture().inspect_err(|err| {
            debug!(rule = %rule, %err, "stack capture failed");
        })?;

        let frames = split_frames(&rendered);
        for frame in &frames {
            self.surface.fire_frame(rule, frame.text, frame.ordinal);
        }

        metrics::record_backtrace(frames.len());
        trace!(rule = %rule, frames = frames.len(), "emitted backtrace");
        Ok(frames.len())
    }
}
