//! In-memory metrics recorder for `--metrics`.

use std::collections::HashMap;
use std::sync::Arc;

use helper_sdt::metrics::{BACKTRACE_DEPTH, FIRINGS_TOTAL, FRAMES_TOTAL, RETIRES_TOTAL};
use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Label, Metadata, Recorder, SharedString, Unit,
};
use parking_lot::RwLock;

use crate::terminal::{self, Table};

type Counters = RwLock<HashMap<Key, u64>>;
type Histograms = RwLock<HashMap<Key, Vec<f64>>>;

struct CliCounter {
    key: Key,
    storage: Arc<Counters>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        *self.storage.write().entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.write().insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: Key,
    storage: Arc<Histograms>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        self.storage
            .write()
            .entry(self.key.clone())
            .or_default()
            .push(value);
    }
}

/// Recorder that keeps the helper-sdt counters and backtrace depths for a
/// summary at exit.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<Counters>,
    histograms: Arc<Histograms>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder.
    ///
    /// Returns `None` if another recorder is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }

    fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            counters: Arc::clone(&self.counters),
            histograms: Arc::clone(&self.histograms),
        }
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key.clone(),
            storage: Arc::clone(&self.counters),
        }))
    }

    // helper-sdt records no gauges.
    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key.clone(),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

fn label<'a>(key: &'a Key, name: &str) -> &'a str {
    key.labels()
        .find(|l| l.key() == name)
        .map_or("-", Label::value)
}

/// Read access to what the installed [`CliRecorder`] collected.
pub struct CliRecorderHandle {
    counters: Arc<Counters>,
    histograms: Arc<Histograms>,
}

impl CliRecorderHandle {
    /// Print probe activity: firings per site, then frame, retire and
    /// backtrace totals.
    pub fn print_summary(&self) {
        terminal::header("Probe activity");
        let table = self.activity_table();
        if table.is_empty() {
            terminal::dim("nothing fired");
            return;
        }
        table.print();
        if let Some((min, max)) = self.backtrace_depth_range() {
            terminal::dim(&format!("backtrace depth {min}..={max}"));
        }
    }

    fn counter(&self, name: &str) -> Option<u64> {
        self.counters
            .read()
            .iter()
            .find(|(key, _)| key.name() == name)
            .map(|(_, &count)| count)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn backtrace_depth_range(&self) -> Option<(u64, u64)> {
        let histograms = self.histograms.read();
        let depths = histograms
            .iter()
            .find(|(key, _)| key.name() == BACKTRACE_DEPTH)
            .map(|(_, depths)| depths)?;
        let min = depths.iter().copied().reduce(f64::min)?;
        let max = depths.iter().copied().reduce(f64::max)?;
        Some((min as u64, max as u64))
    }

    fn activity_table(&self) -> Table {
        let mut table = Table::new(&["event", "abi", "args", "count"])
            .right_align(2)
            .right_align(3);

        let mut firings: Vec<(String, usize, u64)> = {
            let counters = self.counters.read();
            counters
                .iter()
                .filter(|(key, _)| key.name() == FIRINGS_TOTAL)
                .map(|(key, &count)| {
                    let arity = label(key, "arity").parse().unwrap_or_default();
                    (label(key, "abi").to_string(), arity, count)
                })
                .collect()
        };
        firings.sort();
        for (abi, arity, count) in firings {
            table.add_row(vec![
                "fire".to_string(),
                abi,
                arity.to_string(),
                count.to_string(),
            ]);
        }

        let backtraces = self
            .histograms
            .read()
            .iter()
            .find(|(key, _)| key.name() == BACKTRACE_DEPTH)
            .map(|(_, depths)| depths.len() as u64);
        for (event, count) in [
            ("frame", self.counter(FRAMES_TOTAL)),
            ("retire", self.counter(RETIRES_TOTAL)),
            ("backtrace", backtraces),
        ] {
            if let Some(count) = count {
                table.add_row(vec![
                    event.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    count.to_string(),
                ]);
            }
        }
        table
    }
}
