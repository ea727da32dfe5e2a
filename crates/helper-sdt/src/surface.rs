//! The probe-firing surface.

use std::fmt;
use std::sync::Arc;

use helper_sdt_abi::{AbiVersion, Arity, ArityError, MAX_ARITY, ProbeArg, ProbeSite, RuleName};

use crate::backtrace::BacktraceEmitter;
use crate::binding::ProbeBinding;
use crate::{CaptureError, metrics};

/// Fires tracepoints through a [`ProbeBinding`].
///
/// One generic operation covers all 22 (version, arity) probe sites. Cloning
/// shares the binding.
#[derive(Clone)]
pub struct ProbeSurface {
    binding: Arc<dyn ProbeBinding>,
}

impl ProbeSurface {
    #[must_use]
    pub fn new(binding: impl ProbeBinding + 'static) -> Self {
        Self {
            binding: Arc::new(binding),
        }
    }

    #[must_use]
    pub fn with_binding(binding: Arc<dyn ProbeBinding>) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &Arc<dyn ProbeBinding> {
        &self.binding
    }

    /// Fire the `N`-argument probe of `version`.
    ///
    /// `N` above 10 fails to compile.
    pub fn fire<const N: usize>(
        &self,
        version: AbiVersion,
        rule: &RuleName,
        args: [ProbeArg<'_>; N],
    ) {
        const { assert!(N <= MAX_ARITY, "at most 10 probe arguments") };
        if let Some(arity) = Arity::from_count(N) {
            self.dispatch(ProbeSite::new(version, arity), rule, &args);
        }
    }

    /// Fire the probe matching `args.len()`.
    ///
    /// # Errors
    ///
    /// More than 10 arguments is an [`ArityError`]; nothing is fired.
    pub fn fire_dyn(
        &self,
        version: AbiVersion,
        rule: &RuleName,
        args: &[ProbeArg<'_>],
    ) -> Result<(), ArityError> {
        let arity =
            Arity::from_count(args.len()).ok_or(ArityError::TooMany { count: args.len() })?;
        self.dispatch(ProbeSite::new(version, arity), rule, args);
        Ok(())
    }

    /// Fire one backtrace frame.
    pub fn fire_frame(&self, rule: &RuleName, line: &str, ordinal: usize) {
        self.binding.fire_frame(rule, line, ordinal);
        metrics::record_frame();
    }

    /// Release tracer-side state for `rule`.
    pub fn retire(&self, rule: &RuleName) {
        self.binding.retire(rule);
        metrics::record_retire();
    }

    /// Fire the current call stack as frame events under `rule`.
    ///
    /// Does not retire `rule`.
    ///
    /// # Errors
    ///
    /// Returns the [`CaptureError`] when no stack could be captured.
    #[inline(never)]
    pub fn emit_backtrace(&self, rule: &RuleName) -> Result<usize, CaptureError> {
        BacktraceEmitter::new(self.clone()).emit(rule)
    }

    fn dispatch(&self, site: ProbeSite, rule: &RuleName, args: &[ProbeArg<'_>]) {
        self.binding.fire(site, rule, args);
        metrics::record_firing(site);
    }
}

impl fmt::Debug for ProbeSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeSurface")
            .field("binding", &self.binding.name())
            .finish()
    }
}

/// Fire a probe, converting each argument with `Into<ProbeArg>`.
///
/// ```
/// use helper_sdt::{AbiVersion, ProbeSurface, RecordingBinding, fire};
///
/// let surface = ProbeSurface::new(RecordingBinding::new());
/// fire!(surface, AbiVersion::V31, "rule", 1, "two", 3.0);
/// ```
#[macro_export]
macro_rules! fire {
    ($surface:expr, $version:expr, $rule:expr $(, $arg:expr)* $(,)?) => {
        $surface.fire(
            $version,
            &$crate::RuleName::from($rule),
            [$($crate::ProbeArg::from($arg)),*],
        )
    };
}
