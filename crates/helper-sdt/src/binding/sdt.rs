//! In-process static tracepoints.
//!
//! Each (version, arity) pair is its own USDT call site, because a probe is
//! bound to a fixed argument signature when the note is emitted. With no
//! tracer attached every site is a single `nop`.
//!
//! The firing methods stay out of line so each probe note is emitted once.

use helper_sdt_abi::{
    AbiVersion, Arity, LoweredArgs, ProbeArg, ProbeSite, RuleName, nul_terminated,
};
use probe::probe;

use super::ProbeBinding;

/// Binding that fires `helper_sdt` USDT probes in the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SdtBinding;

/// Expand the probe table into one `match` over (version, arity).
macro_rules! sdt_table {
    ($site:expr, $rule:ident, $w:ident;
     $($version:ident $arity:ident => $probe:ident [$($i:literal)*]),* $(,)?) => {
        match ($site.version(), $site.arity()) {
            $((AbiVersion::$version, Arity::$arity) => {
                probe!(helper_sdt, $probe, $rule $(, $w[$i])*);
            })*
        }
    };
}

impl ProbeBinding for SdtBinding {
    fn name(&self) -> &'static str {
        "sdt"
    }

    #[inline(never)]
    fn fire(&self, site: ProbeSite, rule: &RuleName, args: &[ProbeArg<'_>]) {
        let Ok(lowered) = LoweredArgs::new(args) else {
            return;
        };
        let w = lowered.padded();
        let rule = rule.as_c_str().as_ptr();

        sdt_table!(site, rule, w;
            Legacy A0 => method__0 [],
            Legacy A1 => method__1 [0],
            Legacy A2 => method__2 [0 1],
            Legacy A3 => method__3 [0 1 2],
            Legacy A4 => method__4 [0 1 2 3],
            Legacy A5 => method__5 [0 1 2 3 4],
            Legacy A6 => method__6 [0 1 2 3 4 5],
            Legacy A7 => method__7 [0 1 2 3 4 5 6],
            Legacy A8 => method__8 [0 1 2 3 4 5 6 7],
            Legacy A9 => method__9 [0 1 2 3 4 5 6 7 8],
            Legacy A10 => method__10 [0 1 2 3 4 5 6 7 8 9],
            V31 A0 => method__stap31__0 [],
            V31 A1 => method__stap31__1 [0],
            V31 A2 => method__stap31__2 [0 1],
            V31 A3 => method__stap31__3 [0 1 2],
            V31 A4 => method__stap31__4 [0 1 2 3],
            V31 A5 => method__stap31__5 [0 1 2 3 4],
            V31 A6 => method__stap31__6 [0 1 2 3 4 5],
            V31 A7 => method__stap31__7 [0 1 2 3 4 5 6],
            V31 A8 => method__stap31__8 [0 1 2 3 4 5 6 7],
            V31 A9 => method__stap31__9 [0 1 2 3 4 5 6 7 8],
            V31 A10 => method__stap31__10 [0 1 2 3 4 5 6 7 8 9],
        );
    }

    #[inline(never)]
    fn fire_frame(&self, rule: &RuleName, line: &str, ordinal: usize) {
        let line = nul_terminated(line.as_bytes());
        probe!(
            helper_sdt,
            method__bt,
            rule.as_c_str().as_ptr(),
            line.as_ptr(),
            ordinal
        );
    }

    #[inline(never)]
    fn retire(&self, rule: &RuleName) {
        probe!(helper_sdt, method__bt__delete, rule.as_c_str().as_ptr());
    }
}
