//! Backtrace command.

use helper_sdt::{ProbeSurface, RuleName};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `backtrace` command.
pub fn cmd_backtrace(surface: &ProbeSurface, rule: &str, retire: bool) -> i32 {
    let rule = RuleName::from(rule);
    match surface.emit_backtrace(&rule) {
        Ok(frames) => {
            if retire {
                surface.retire(&rule);
            }
            info!(rule = %rule, frames, retired = retire, "emitted backtrace");
            EXIT_SUCCESS
        }
        Err(err) => {
            error!(rule = %rule, error = %err, "backtrace capture failed");
            EXIT_FAILURE
        }
    }
}
