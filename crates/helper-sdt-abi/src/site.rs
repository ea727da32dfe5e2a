//! The fixed entry-point table.
//!
//! Every probe site has two names: the USDT probe name under [`PROVIDER`]
//! (what `stap -L 'process("...").mark("*")'` lists, with `__` shown as `-`)
//! and the symbol a native runtime module exports for it.

use std::fmt;

use crate::{AbiVersion, Arity, MAX_ARITY};

/// USDT provider name shared by every entry point.
pub const PROVIDER: &str = "helper_sdt";

const LEGACY_PROBES: [&str; MAX_ARITY + 1] = [
    "method__0",
    "method__1",
    "method__2",
    "method__3",
    "method__4",
    "method__5",
    "method__6",
    "method__7",
    "method__8",
    "method__9",
    "method__10",
];

const V31_PROBES: [&str; MAX_ARITY + 1] = [
    "method__stap31__0",
    "method__stap31__1",
    "method__stap31__2",
    "method__stap31__3",
    "method__stap31__4",
    "method__stap31__5",
    "method__stap31__6",
    "method__stap31__7",
    "method__stap31__8",
    "method__stap31__9",
    "method__stap31__10",
];

const LEGACY_SYMBOLS: [&str; MAX_ARITY + 1] = [
    "helper_sdt_probe0",
    "helper_sdt_probe1",
    "helper_sdt_probe2",
    "helper_sdt_probe3",
    "helper_sdt_probe4",
    "helper_sdt_probe5",
    "helper_sdt_probe6",
    "helper_sdt_probe7",
    "helper_sdt_probe8",
    "helper_sdt_probe9",
    "helper_sdt_probe10",
];

const V31_SYMBOLS: [&str; MAX_ARITY + 1] = [
    "helper_sdt31_probe0",
    "helper_sdt31_probe1",
    "helper_sdt31_probe2",
    "helper_sdt31_probe3",
    "helper_sdt31_probe4",
    "helper_sdt31_probe5",
    "helper_sdt31_probe6",
    "helper_sdt31_probe7",
    "helper_sdt31_probe8",
    "helper_sdt31_probe9",
    "helper_sdt31_probe10",
];

/// A (version, arity) pair: one fixed-signature probe entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeSite {
    version: AbiVersion,
    arity: Arity,
}

impl ProbeSite {
    #[must_use]
    pub const fn new(version: AbiVersion, arity: Arity) -> Self {
        Self { version, arity }
    }

    #[must_use]
    pub const fn version(self) -> AbiVersion {
        self.version
    }

    #[must_use]
    pub const fn arity(self) -> Arity {
        self.arity
    }

    /// USDT probe name.
    #[must_use]
    pub const fn probe_name(self) -> &'static str {
        match self.version {
            AbiVersion::Legacy => LEGACY_PROBES[self.arity.count()],
            AbiVersion::V31 => V31_PROBES[self.arity.count()],
        }
    }

    /// Symbol exported by a native runtime module.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self.version {
            AbiVersion::Legacy => LEGACY_SYMBOLS[self.arity.count()],
            AbiVersion::V31 => V31_SYMBOLS[self.arity.count()],
        }
    }

    /// All 22 probe sites, version-major.
    pub fn all() -> impl Iterator<Item = Self> {
        AbiVersion::ALL
            .into_iter()
            .flat_map(|version| Arity::ALL.into_iter().map(move |arity| Self::new(version, arity)))
    }
}

impl fmt::Display for ProbeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.version, self.arity)
    }
}

/// One row of the native entry-point table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Generic probe firing.
    Probe(ProbeSite),
    /// One backtrace frame: `(rule, line, ordinal)`.
    Frame,
    /// Release tracer-side resources held for a rule name.
    Retire,
}

impl EntryPoint {
    /// Number of rows in the table.
    pub const COUNT: usize = 2 * (MAX_ARITY + 1) + 2;

    #[must_use]
    pub const fn probe_name(self) -> &'static str {
        match self {
            Self::Probe(site) => site.probe_name(),
            Self::Frame => "method__bt",
            Self::Retire => "method__bt__delete",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Probe(site) => site.symbol(),
            Self::Frame => "helper_sdt_bt",
            Self::Retire => "helper_sdt_bt_delete",
        }
    }

    /// Row position in [`Self::all`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Probe(site) => site.version().index() * (MAX_ARITY + 1) + site.arity().count(),
            Self::Frame => Self::COUNT - 2,
            Self::Retire => Self::COUNT - 1,
        }
    }

    /// Arguments after the rule name.
    #[must_use]
    pub const fn arg_count(self) -> usize {
        match self {
            Self::Probe(site) => site.arity().count(),
            Self::Frame => 2,
            Self::Retire => 0,
        }
    }

    /// The whole table: probe sites first, then frame and retire.
    pub fn all() -> impl Iterator<Item = Self> {
        ProbeSite::all()
            .map(Self::Probe)
            .chain([Self::Frame, Self::Retire])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_table_size() {
        assert_eq!(ProbeSite::all().count(), 22);
        assert_eq!(EntryPoint::all().count(), EntryPoint::COUNT);
    }

    #[test]
    fn test_index_matches_table_order() {
        for (i, entry) in EntryPoint::all().enumerate() {
            assert_eq!(entry.index(), i, "{entry:?}");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let probes: HashSet<_> = EntryPoint::all().map(EntryPoint::probe_name).collect();
        let symbols: HashSet<_> = EntryPoint::all().map(EntryPoint::symbol).collect();
        assert_eq!(probes.len(), EntryPoint::COUNT);
        assert_eq!(symbols.len(), EntryPoint::COUNT);
    }

    #[test]
    fn test_names_follow_arity() {
        let site = ProbeSite::new(AbiVersion::V31, Arity::A7);
        assert_eq!(site.probe_name(), "method__stap31__7");
        assert_eq!(site.symbol(), "helper_sdt31_probe7");

        let site = ProbeSite::new(AbiVersion::Legacy, Arity::A10);
        assert_eq!(site.probe_name(), "method__10");
        assert_eq!(site.symbol(), "helper_sdt_probe10");
        assert_eq!(EntryPoint::Probe(site).arg_count(), 10);
        assert_eq!(EntryPoint::Frame.arg_count(), 2);
    }
}
