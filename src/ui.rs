//! Terminal output.
//!
//! Status lines use the same glyph prefixes throughout (`✓`, `!`, `x`, `▶`).
//! While the libs stage runs, lines go through [`Progress`] so they are printed
//! above the progress bar instead of through it.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;

pub fn step(msg: impl Display) {
    println!("{} {}", "▶".cyan(), msg);
}

pub fn success(msg: impl Display) {
    println!("{} {}", "✓".green(), msg);
}

pub fn warn(msg: impl Display) {
    println!("{} {}", "!".yellow(), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{} {}", "x".red(), msg);
}

/// Indented subordinate output, shown after a failure.
pub fn captured(output: &str) {
    for line in output.lines() {
        eprintln!("    {}", line.dimmed());
    }
}

/// Progress over a fixed number of module pipelines.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(len: usize, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(len as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    pub fn start(&self, module: &str) {
        self.bar.set_message(format!("Building {module}"));
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    /// Prints a line above the bar; still printed when the bar is hidden.
    pub fn line(&self, msg: impl Display) {
        self.bar.suspend(|| println!("{msg}"));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Plain box-drawn table sized to its content.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(console::measure_text_width(cell));
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let pad = w.saturating_sub(console::measure_text_width(cell));
                    format!(" {}{} ", cell, " ".repeat(pad))
                })
                .collect();
            format!("  │{}│", padded.join("│"))
        };

        let mut out = vec![rule("┌", "┬", "┐"), line(&self.headers), rule("├", "┼", "┤")];
        out.extend(self.rows.iter().map(|row| line(row)));
        out.push(rule("└", "┴", "┘"));
        out.join("\n")
    }

    pub fn print(&self) {
        if !self.headers.is_empty() {
            println!("{}", self.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_pads_to_widest_cell() {
        let mut table = Table::new(&["Module", "Library"]);
        table.add_row(vec!["Physics-Engine".into(), "physicsengine".into()]);
        table.add_row(vec!["net_io".into(), "netio".into()]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("│ Module         │ Library       │"));
        assert!(lines[4].contains("│ net_io         │ netio         │"));
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn test_mismatched_row_ignored() {
        let mut table = Table::new(&["A", "B"]);
        table.add_row(vec!["only one".into()]);
        assert_eq!(table.render().lines().count(), 4);
    }

    #[test]
    fn test_colored_cells_measured_without_escapes() {
        let mut table = Table::new(&["Status"]);
        table.add_row(vec!["\u{1b}[32mok\u{1b}[0m".into()]);
        let rendered = table.render();
        assert!(rendered.lines().next().unwrap().contains("────────"));
    }
}
