//! Fire and retire commands.

use helper_sdt::{AbiVersion, ProbeArg, ProbeSurface, RuleName};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `fire` command.
pub fn cmd_fire(
    surface: &ProbeSurface,
    rule: &str,
    version: AbiVersion,
    args: &[ProbeArg<'static>],
    repeat: u64,
) -> i32 {
    let rule = RuleName::from(rule);
    for _ in 0..repeat {
        if let Err(err) = surface.fire_dyn(version, &rule, args) {
            error!(error = %err, "probe not fired");
            return EXIT_FAILURE;
        }
    }
    info!(rule = %rule, abi = %version, arity = args.len(), repeat, "fired");
    EXIT_SUCCESS
}

/// Handle the `retire` command.
pub fn cmd_retire(surface: &ProbeSurface, rule: &str) -> i32 {
    let rule = RuleName::from(rule);
    surface.retire(&rule);
    info!(rule = %rule, "retired");
    EXIT_SUCCESS
}
