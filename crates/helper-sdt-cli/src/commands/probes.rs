//! Probe table listing.

use helper_sdt::{EntryPoint, PROVIDER};

use crate::cli::EXIT_SUCCESS;
use crate::terminal::{self, Table};

/// Handle the `probes` command.
pub fn cmd_probes() -> i32 {
    terminal::header(&format!("Provider {PROVIDER}"));
    probe_table().print();
    EXIT_SUCCESS
}

fn probe_table() -> Table {
    let mut table = Table::new(&["#", "abi", "args", "probe", "symbol"])
        .right_align(0)
        .right_align(2);
    for entry in EntryPoint::all() {
        let abi = match entry {
            EntryPoint::Probe(site) => site.version().as_str(),
            EntryPoint::Frame | EntryPoint::Retire => "-",
        };
        table.add_row(vec![
            entry.index().to_string(),
            abi.to_string(),
            entry.arg_count().to_string(),
            entry.probe_name().to_string(),
            entry.symbol().to_string(),
        ]);
    }
    table
}
