//! Command implementations.
//!
//! Each submodule handles a specific CLI command or group of commands.

mod backtrace;
mod fire;
mod probes;

use std::sync::Arc;

use helper_sdt::{Backend, BindingConfig, BindingError, ProbeSurface, RecordingBinding};
use tracing::error;

use crate::cli::{Cli, Commands, EXIT_FAILURE};
use crate::terminal;

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Fire {
            rule,
            abi,
            repeat,
            args,
        } => with_surface(cli, |surface| {
            fire::cmd_fire(surface, rule, (*abi).into(), args, *repeat)
        }),
        Commands::Backtrace { rule, no_retire } => with_surface(cli, |surface| {
            backtrace::cmd_backtrace(surface, rule, !*no_retire)
        }),
        Commands::Retire { rule } => with_surface(cli, |surface| fire::cmd_retire(surface, rule)),
        Commands::Probes => probes::cmd_probes(),
    }
}

/// Run a command against the process-wide surface, printing what the record
/// backend captured once it returns.
fn with_surface(cli: &Cli, command: impl FnOnce(&ProbeSurface) -> i32) -> i32 {
    let (surface, recording) = match open_surface(cli) {
        Ok(opened) => opened,
        Err(err) => {
            error!(error = %err, "failed to initialize probe binding");
            return EXIT_FAILURE;
        }
    };

    let exit_code = command(surface);

    if let Some(recording) = recording {
        print_recorded(&recording);
    }

    exit_code
}

/// Environment configuration with command-line flags layered on top.
fn binding_config(cli: &Cli) -> Result<BindingConfig, BindingError> {
    let mut config = BindingConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(library) = &cli.library {
        config.library = Some(library.clone());
    }
    if !cli.search_dirs.is_empty() {
        let mut dirs = cli.search_dirs.clone();
        dirs.append(&mut config.search_dirs);
        config.search_dirs = dirs;
    }
    Ok(config)
}

/// Install the process-wide surface. The record backend also hands back
/// its recorder so the firings can be printed at exit.
fn open_surface(
    cli: &Cli,
) -> Result<(&'static ProbeSurface, Option<Arc<RecordingBinding>>), BindingError> {
    let config = binding_config(cli)?;
    if config.backend == Backend::Record {
        let recording = Arc::new(RecordingBinding::new());
        let surface = helper_sdt::install(ProbeSurface::with_binding(recording.clone()))?;
        return Ok((surface, Some(recording)));
    }
    Ok((helper_sdt::init(&config)?, None))
}

fn print_recorded(recording: &RecordingBinding) {
    let firings = recording.take();
    terminal::header(&format!("Recorded firings ({})", firings.len()));
    if firings.is_empty() {
        terminal::dim("none");
    }
    for firing in firings {
        println!("{firing}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::EXIT_SUCCESS;
    use clap::Parser;

    fn parse_with_missing_module(command: &[&str]) -> Cli {
        let mut argv = vec![
            "helper-sdt",
            "--backend",
            "library",
            "--library",
            "/nonexistent/libHelperSDT_missing.so",
        ];
        argv.extend_from_slice(command);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_entry_point_listing_needs_no_binding() {
        let cli = parse_with_missing_module(&["probes"]);
        assert_eq!(run_command(&cli), EXIT_SUCCESS);
    }

    #[test]
    fn test_binding_failure_exits_with_failure() {
        let cli = parse_with_missing_module(&["retire", "--rule", "r"]);
        assert_eq!(run_command(&cli), EXIT_FAILURE);
        assert!(helper_sdt::global().is_none());
    }
}
