//! In-memory binding.

use std::fmt;

use helper_sdt_abi::{EntryPoint, ProbeArg, ProbeSite, RuleName};
use parking_lot::Mutex;

use super::ProbeBinding;

/// One firing as delivered to the runtime binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Firing {
    pub entry: EntryPoint,
    pub rule: String,
    pub args: Vec<ProbeArg<'static>>,
}

impl Firing {
    /// Probe site, for generic probe firings.
    #[must_use]
    pub const fn site(&self) -> Option<ProbeSite> {
        match self.entry {
            EntryPoint::Probe(site) => Some(site),
            EntryPoint::Frame | EntryPoint::Retire => None,
        }
    }
}

impl fmt::Display for Firing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}", self.entry.probe_name(), self.rule)?;
        for arg in &self.args {
            write!(f, ", {arg}")?;
        }
        f.write_str(")")
    }
}

/// Binding that records every firing instead of delivering it.
///
/// Frame firings are recorded with two arguments, `[Str(line), UInt(ordinal)]`.
#[derive(Debug, Default)]
pub struct RecordingBinding {
    firings: Mutex<Vec<Firing>>,
}

impl RecordingBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in firing order.
    #[must_use]
    pub fn firings(&self) -> Vec<Firing> {
        self.firings.lock().clone()
    }

    /// Drain the recorded firings.
    pub fn take(&self) -> Vec<Firing> {
        std::mem::take(&mut *self.firings.lock())
    }

    /// Firings recorded under `rule`, in order.
    #[must_use]
    pub fn firings_for(&self, rule: &str) -> Vec<Firing> {
        self.firings
            .lock()
            .iter()
            .filter(|firing| firing.rule == rule)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.firings.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.firings.lock().is_empty()
    }

    fn push(&self, entry: EntryPoint, rule: &RuleName, args: Vec<ProbeArg<'static>>) {
        self.firings.lock().push(Firing {
            entry,
            rule: rule.to_str_lossy().into_owned(),
            args,
        });
    }
}

impl ProbeBinding for RecordingBinding {
    fn name(&self) -> &'static str {
        "record"
    }

    fn fire(&self, site: ProbeSite, rule: &RuleName, args: &[ProbeArg<'_>]) {
        let args = args.iter().cloned().map(ProbeArg::into_owned).collect();
        self.push(EntryPoint::Probe(site), rule, args);
    }

    fn fire_frame(&self, rule: &RuleName, line: &str, ordinal: usize) {
        let args = vec![ProbeArg::from(line.to_string()), ProbeArg::from(ordinal)];
        self.push(EntryPoint::Frame, rule, args);
    }

    fn retire(&self, rule: &RuleName) {
        self.push(EntryPoint::Retire, rule, Vec::new());
    }
}
