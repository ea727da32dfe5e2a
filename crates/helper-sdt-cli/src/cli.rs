//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use helper_sdt::{AbiVersion, Backend, ProbeArg};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "helper-sdt")]
#[command(about = "Fire helper_sdt static tracepoints from the command line")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Probe backend (overrides HELPER_SDT_BACKEND)
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendArg>,

    /// Native probe module to load (overrides HELPER_SDT_LIBRARY)
    #[arg(long, value_name = "PATH", global = true)]
    pub library: Option<PathBuf>,

    /// Directory to search for the native probe module, before HELPER_SDT_PATH
    #[arg(long = "search-dir", value_name = "DIR", global = true)]
    pub search_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fire a probe with up to 10 arguments
    ///
    /// Arguments are typed by their spelling: `null`, `true`/`false`,
    /// integers (decimal or 0x hex), floats, anything else is a string.
    /// Prefix with s:, i:, u:, f:, b: or c: to force a kind.
    Fire {
        /// Rule name
        #[arg(long)]
        rule: String,

        /// Probe ABI version
        #[arg(long, value_enum, default_value = "v3.1")]
        abi: AbiArg,

        /// Number of times to fire
        #[arg(long, default_value_t = 1)]
        repeat: u64,

        /// Probe arguments
        #[arg(value_name = "ARG", value_parser = parse_probe_arg, allow_negative_numbers = true)]
        args: Vec<ProbeArg<'static>>,
    },
    /// Fire the current call stack, one frame per line
    Backtrace {
        /// Rule name
        #[arg(long)]
        rule: String,

        /// Leave the rule live instead of retiring it afterwards
        #[arg(long)]
        no_retire: bool,
    },
    /// Retire a rule name
    Retire {
        /// Rule name
        #[arg(long)]
        rule: String,
    },
    /// List the probe entry points
    Probes,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    /// USDT probes in this process
    Sdt,
    /// Native probe module loaded from disk
    Library,
    /// Record firings and print them at exit
    Record,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sdt => Self::Sdt,
            BackendArg::Library => Self::Library,
            BackendArg::Record => Self::Record,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum AbiArg {
    /// First-generation probe ABI
    Legacy,
    /// SystemTap 3.1 probe ABI
    #[default]
    #[value(name = "v3.1", alias = "v31")]
    V31,
}

impl From<AbiArg> for AbiVersion {
    fn from(arg: AbiArg) -> Self {
        match arg {
            AbiArg::Legacy => Self::Legacy,
            AbiArg::V31 => Self::V31,
        }
    }
}

/// Parse one command-line probe argument.
pub fn parse_probe_arg(raw: &str) -> Result<ProbeArg<'static>, String> {
    if let Some((kind, value)) = raw.split_once(':') {
        let forced = match kind {
            "s" => Some(Ok(ProbeArg::from(value.to_string()))),
            "i" => Some(parse_int(value).map(ProbeArg::Int)),
            "u" => Some(parse_uint(value).map(ProbeArg::UInt)),
            "f" => Some(value.parse().map(ProbeArg::Float).map_err(|e| e.to_string())),
            "b" => Some(value.parse().map(ProbeArg::Bool).map_err(|e| e.to_string())),
            "c" => Some(value.parse().map(ProbeArg::Char).map_err(|e| e.to_string())),
            _ => None,
        };
        if let Some(forced) = forced {
            return forced.map_err(|e| format!("invalid {kind}: argument '{value}': {e}"));
        }
    }

    Ok(match raw {
        "null" => ProbeArg::Null,
        "true" => ProbeArg::Bool(true),
        "false" => ProbeArg::Bool(false),
        _ => {
            if let Ok(value) = parse_int(raw) {
                ProbeArg::Int(value)
            } else if let Ok(value) = parse_uint(raw) {
                ProbeArg::UInt(value)
            } else if let Some(value) = parse_float(raw) {
                ProbeArg::Float(value)
            } else {
                ProbeArg::from(raw.to_string())
            }
        }
    })
}

fn parse_int(s: &str) -> Result<i64, String> {
    match s.strip_prefix("-") {
        Some(rest) if rest.starts_with("0x") => parse_uint(rest).and_then(|v| {
            0_i64
                .checked_sub_unsigned(v)
                .ok_or_else(|| "out of range".to_string())
        }),
        _ if s.starts_with("0x") => {
            parse_uint(s).and_then(|v| i64::try_from(v).map_err(|e| e.to_string()))
        }
        _ => s.parse().map_err(|e: std::num::ParseIntError| e.to_string()),
    }
}

fn parse_uint(s: &str) -> Result<u64, String> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => s.parse().map_err(|e: std::num::ParseIntError| e.to_string()),
    }
}

/// Floats must contain a digit, so `inf` and `nan` stay strings.
fn parse_float(s: &str) -> Option<f64> {
    if s.bytes().any(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}
