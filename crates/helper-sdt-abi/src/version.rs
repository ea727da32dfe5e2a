//! ABI generations and argument counts.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Largest number of probe arguments (not counting the rule name).
pub const MAX_ARITY: usize = 10;

/// Calling convention generation of the native tracer runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbiVersion {
    /// First-generation entry points.
    Legacy,
    /// SystemTap 3.1 entry points.
    V31,
}

impl AbiVersion {
    /// All versions, in table order.
    pub const ALL: [Self; 2] = [Self::Legacy, Self::V31];

    /// Short label used in metrics, logs and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::V31 => "v3.1",
        }
    }

    /// Position of this version in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized ABI version name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown ABI version '{0}' (expected 'legacy' or 'v3.1')")]
pub struct ParseAbiVersionError(pub String);

impl FromStr for AbiVersion {
    type Err = ParseAbiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "v3.1" | "v31" | "stap31" | "3.1" => Ok(Self::V31),
            _ => Err(ParseAbiVersionError(s.to_string())),
        }
    }
}

/// Number of positional arguments a probe entry point takes.
///
/// The native side binds tracepoints at fixed call-site signatures, so the
/// argument count is a closed set rather than a free integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    A8,
    A9,
    A10,
}

impl Arity {
    /// All arities, ascending.
    pub const ALL: [Self; MAX_ARITY + 1] = [
        Self::A0,
        Self::A1,
        Self::A2,
        Self::A3,
        Self::A4,
        Self::A5,
        Self::A6,
        Self::A7,
        Self::A8,
        Self::A9,
        Self::A10,
    ];

    const LABELS: [&'static str; MAX_ARITY + 1] =
        ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];

    /// Map an argument count to its arity, if one exists.
    #[must_use]
    pub const fn from_count(count: usize) -> Option<Self> {
        if count <= MAX_ARITY {
            Some(Self::ALL[count])
        } else {
            None
        }
    }

    /// Number of arguments.
    #[must_use]
    pub const fn count(self) -> usize {
        self as usize
    }

    /// Decimal label, for metric labels.
    #[must_use]
    pub const fn label(self) -> &'static str {
        Self::LABELS[self.count()]
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
