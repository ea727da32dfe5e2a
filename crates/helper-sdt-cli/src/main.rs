//! helper-sdt CLI - fire static tracepoints by hand

mod cli;
mod commands;
mod recorder;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Initialize metrics recorder if enabled
    let metrics_handle = if cli.metrics {
        recorder::CliRecorder::new().install()
    } else {
        None
    };
    helper_sdt::metrics::init();

    let default_level = if cli.verbose {
        "helper_sdt=debug"
    } else if cli.silent {
        "helper_sdt=error"
    } else {
        "helper_sdt=info"
    };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = default_level.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
