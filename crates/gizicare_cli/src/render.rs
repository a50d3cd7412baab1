//! Plain-text tables and JSON output for command results.

use crate::error::CliResult;
use serde::Serialize;
use std::fmt::Write as _;

/// How a command prints its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Pretty JSON of `value`, or the text produced by `text`.
    pub fn emit<T, F>(self, value: &T, text: F) -> CliResult<String>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(value)?),
            Self::Text => Ok(text(value)),
        }
    }
}

/// Left-aligned text table sized to its widest cell.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let cols = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0usize; cols];
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        write_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(&mut out, &rule, &widths);
        for row in &self.rows {
            write_line(&mut out, row, &widths);
        }
        out
    }
}

fn write_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        let pad = width.saturating_sub(cell.chars().count());
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', pad));
    }
    let _ = writeln!(out, "{}", line.trim_end());
}

/// `1234.6` -> `1.235` (thousands separated with dots, no decimals).
pub fn int(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if negative && digits != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// One decimal place, e.g. `22.9`.
pub fn dec(value: f64) -> String {
    format!("{value:.1}")
}

pub fn kcal(value: f64) -> String {
    format!("{} kcal", int(value))
}

/// Signed percentage change, `-` when absent.
pub fn change(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("+{v:.1}%"),
        Some(v) => format!("{v:.1}%"),
        None => "-".to_string(),
    }
}

/// Text progress bar for a 0..=100 percentage.
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        ".".repeat(width.saturating_sub(filled)),
        percent.clamp(0.0, 100.0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let mut t = Table::new(["Tanggal", "Kalori"]);
        t.row(["2025-06-10", "1.800"]).row(["2025-06-11", "950"]);
        let text = t.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Tanggal     Kalori");
        assert_eq!(lines[1], "----------  ------");
        assert_eq!(lines[3], "2025-06-11  950");
    }

    #[test]
    fn numbers_use_dot_grouping() {
        assert_eq!(int(1234.6), "1.235");
        assert_eq!(int(999.0), "999");
        assert_eq!(int(-2500.0), "-2.500");
        assert_eq!(int(1_000_000.0), "1.000.000");
        assert_eq!(kcal(2325.0), "2.325 kcal");
    }

    #[test]
    fn change_and_bar() {
        assert_eq!(change(Some(12.34)), "+12.3%");
        assert_eq!(change(Some(-5.0)), "-5.0%");
        assert_eq!(change(None), "-");
        assert_eq!(bar(50.0, 10), "[#####.....] 50%");
        assert_eq!(bar(140.0, 4), "[####] 100%");
    }

    #[test]
    fn json_format_serializes() {
        let out = Format::Json.emit(&vec![1, 2], |_| String::new()).unwrap();
        assert_eq!(out, "[\n  1,\n  2\n]");
    }
}
