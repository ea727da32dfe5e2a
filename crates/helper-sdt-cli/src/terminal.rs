//! Styled terminal output.

use std::io::{self, Write};

use console::style;

/// Print a bold section header.
pub fn header(message: &str) {
    eprintln!("\n{}", style(message).bold());
}

/// Print a dimmed, indented line.
pub fn dim(message: &str) {
    eprintln!("  {}", style(message).dim());
}

/// Space-separated columns under a dashed rule.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Indices of right-aligned (numeric) columns.
    right: Vec<usize>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
            right: Vec::new(),
        }
    }

    #[must_use]
    pub fn right_align(mut self, column: usize) -> Self {
        self.right.push(column);
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .chain(std::iter::once(&self.headers[i]))
                    .map(String::len)
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();

        let mut output = String::new();
        for row in std::iter::once(&self.headers)
            .chain(std::iter::once(&rule))
            .chain(&self.rows)
        {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if self.right.contains(&i) {
                        format!("{cell:>w$}")
                    } else {
                        format!("{cell:<w$}")
                    }
                })
                .collect();
            output.push_str(cells.join("  ").trim_end());
            output.push('\n');
        }
        output
    }

    /// Print the table to stdout.
    pub fn print(&self) {
        print!("{}", self.render());
        let _ = io::stdout().flush();
    }
}
