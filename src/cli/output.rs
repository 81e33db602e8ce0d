//! Operator-facing terminal output.
//!
//! Colour is applied only when stdout is a terminal so piped output stays
//! plain text.

use std::fmt::Display;
use std::io::IsTerminal;

use owo_colors::OwoColorize;

/// Column widths for the live audit lines, matching [`crate::app::AUDIT_COLUMNS`].
const AUDIT_WIDTHS: [usize; 10] = [18, 8, 15, 12, 8, 9, 11, 10, 36, 8];

fn styled() -> bool {
    std::io::stdout().is_terminal()
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    if styled() {
        println!("{} {}", "gatewire".bold(), version.dimmed());
    } else {
        println!("gatewire {version}");
    }
    println!();
}

/// Print a section header.
pub fn section(title: &str) {
    println!();
    if styled() {
        println!("{}", title.bold());
    } else {
        println!("{title}");
    }
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if styled() {
        println!("  {:<12} {}", label.dimmed(), value);
    } else {
        println!("  {label:<12} {value}");
    }
}

pub fn success(message: &str) {
    if styled() {
        println!("  {} {}", "✓".green(), message);
    } else {
        println!("  ✓ {message}");
    }
}

pub fn warning(message: &str) {
    if styled() {
        println!("  {} {}", "⚠".yellow(), message);
    } else {
        println!("  ⚠ {message}");
    }
}

pub fn note(message: &str) {
    if styled() {
        println!("  {}", message.dimmed());
    } else {
        println!("  {message}");
    }
}

/// Status bar line for the monitor.
pub fn status(text: &str) {
    if styled() {
        println!("{} {}", "status".cyan(), text);
    } else {
        println!("status {text}");
    }
}

/// Modal-style message block.
pub fn message(title: &str, text: &str) {
    if styled() {
        println!("{}", title.red().bold());
    } else {
        println!("{title}");
    }
    for line in text.lines() {
        println!("  {line}");
    }
}

/// Fixed-width line of audit cells.
#[must_use]
pub fn audit_line(cells: &[&str]) -> String {
    cells
        .iter()
        .zip(AUDIT_WIDTHS)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

/// Header line for the live audit log.
pub fn audit_header(columns: &[&str]) {
    let line = audit_line(columns);
    if styled() {
        println!("{}", line.bold());
    } else {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AUDIT_COLUMNS;

    #[test]
    fn audit_line_pads_each_column() {
        let line = audit_line(&AUDIT_COLUMNS);
        assert!(line.starts_with(&format!("{:<18} {:<8} ", "Event", "Account")));
        for column in AUDIT_COLUMNS {
            assert!(line.contains(column));
        }
    }

    #[test]
    fn audit_line_trims_trailing_padding() {
        let line = audit_line(&["OrderAdded", "ACC1"]);
        assert_eq!(line, format!("{:<18} ACC1", "OrderAdded"));
    }
}
