//! Per-function timing summary
//!
//! Reads every line of a [`Recorder`], sums `time_ns` per function identity
//! and renders a grid table sorted by total time, slowest first:
//!
//! ```text
//! +----------------+------------+-------------+-------------+
//! | Function       |   Time (s) |   Time (ms) |   Time (ns) |
//! +================+============+=============+=============+
//! | app::db.fetch  |  0.0120346 |     12.0346 |    12034567 |
//! +----------------+------------+-------------+-------------+
//! | app::db.store  |  0.0030001 |      3.0001 |     3000100 |
//! +----------------+------------+-------------+-------------+
//! ```
//!
//! A line that does not parse as a timing event fails the whole report with
//! [`TimedError::MalformedRecord`]; nothing is skipped and nothing is printed.

use crate::error::{Result, TimedError};
use crate::event::TimingEvent;
use crate::recorder::Recorder;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

const HEADERS: [&str; 4] = ["Function", "Time (s)", "Time (ms)", "Time (ns)"];

/// Significant digits for the seconds and milliseconds columns
const FLOAT_PRECISION: usize = 6;

/// Extra width every header gets over its own length
const HEADER_PADDING: usize = 2;

/// Total time recorded for one function identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateEntry {
    pub function: String,
    pub total_ns: u64,
}

/// One rendered row of the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub function: String,
    pub seconds: f64,
    pub millis: f64,
    pub nanos: u64,
}

impl From<AggregateEntry> for ReportRow {
    fn from(entry: AggregateEntry) -> Self {
        Self {
            seconds: entry.total_ns as f64 / 1e9,
            millis: entry.total_ns as f64 / 1e6,
            nanos: entry.total_ns,
            function: entry.function,
        }
    }
}

/// Sum event durations per function identity
///
/// Entries come back in order of first appearance. Any line that fails to
/// parse, blank lines included, aborts with its 1-based line number.
pub fn aggregate<I, S>(lines: I) -> Result<Vec<AggregateEntry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<AggregateEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let event = TimingEvent::from_line(line).map_err(|source| {
            tracing::warn!(line = i + 1, error = %source, "malformed timing record");
            TimedError::MalformedRecord {
                line: i + 1,
                source,
            }
        })?;

        match index.get(&event.function) {
            Some(&slot) => {
                let entry = &mut entries[slot];
                entry.total_ns = entry.total_ns.saturating_add(event.time_ns);
            }
            None => {
                index.insert(event.function.clone(), entries.len());
                entries.push(AggregateEntry {
                    function: event.function,
                    total_ns: event.time_ns,
                });
            }
        }
    }

    Ok(entries)
}

/// Sorted per-function totals, ready to render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    /// Build rows from aggregate entries, slowest first
    ///
    /// The sort is stable: equal totals keep the order they were given in.
    pub fn from_entries(entries: Vec<AggregateEntry>) -> Self {
        let mut rows: Vec<ReportRow> = entries.into_iter().map(ReportRow::from).collect();
        rows.sort_by(|a, b| b.nanos.cmp(&a.nanos));
        Self { rows }
    }

    /// Read the whole buffer from the start and aggregate it
    pub fn from_recorder(recorder: &Recorder) -> Result<Self> {
        let lines = recorder.read_all();
        let report = Self::from_entries(aggregate(&lines)?);
        tracing::debug!(
            records = lines.len(),
            functions = report.rows.len(),
            "built timing report"
        );
        Ok(report)
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the grid table (trailing newline included)
    pub fn render(&self) -> String {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.function.clone(),
                    format_general(row.seconds, FLOAT_PRECISION),
                    format_general(row.millis, FLOAT_PRECISION),
                    row.nanos.to_string(),
                ]
            })
            .collect();

        let mut columns: [Vec<String>; 4] = Default::default();
        for row in cells {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        // Numeric columns line up on the decimal point, like a ledger.
        for column in columns.iter_mut().skip(1) {
            align_decimal(column);
        }

        let widths: Vec<usize> = HEADERS
            .iter()
            .zip(columns.iter())
            .map(|(header, column)| {
                column
                    .iter()
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count() + HEADER_PADDING)
            })
            .collect();

        // Without data there is no numeric column to align headers against.
        let numeric = !self.rows.is_empty();
        let align = |col: usize| -> Align {
            if col > 0 && numeric {
                Align::Right
            } else {
                Align::Left
            }
        };

        let mut out = String::new();
        out.push_str(&rule(&widths, '-'));
        out.push_str(&line(
            HEADERS.iter().enumerate().map(|(i, h)| (*h, widths[i], align(i))),
        ));
        out.push_str(&rule(&widths, '='));
        for i in 0..self.rows.len() {
            out.push_str(&line(
                columns
                    .iter()
                    .enumerate()
                    .map(|(col, cells)| (cells[i].as_str(), widths[col], align(col))),
            ));
            out.push_str(&rule(&widths, '-'));
        }
        out
    }

    /// Write the rendered table to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Print the report for `recorder` to standard output
pub fn print_report(recorder: &Recorder) -> Result<()> {
    let report = Report::from_recorder(recorder)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    report.write_to(&mut handle)
}

/// Print the report for the process-wide recorder to standard output
pub fn process_logs() -> Result<()> {
    print_report(Recorder::global())
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

fn rule(widths: &[usize], fill: char) -> String {
    let mut out = String::from("+");
    for &width in widths {
        out.extend(std::iter::repeat(fill).take(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line<'a>(cells: impl Iterator<Item = (&'a str, usize, Align)>) -> String {
    let mut out = String::from("|");
    for (text, width, align) in cells {
        match align {
            Align::Left => out.push_str(&format!(" {:<width$} |", text, width = width)),
            Align::Right => out.push_str(&format!(" {:>width$} |", text, width = width)),
        }
    }
    out.push('\n');
    out
}

/// Characters after the decimal point, or after the exponent marker when
/// there is no point; `None` for integers
fn after_point(cell: &str) -> Option<usize> {
    cell.rfind('.')
        .or_else(|| cell.rfind(|c: char| c == 'e' || c == 'E'))
        .map(|pos| cell.len() - pos - 1)
}

/// Right-pad cells so their decimal points share a column
fn align_decimal(column: &mut [String]) {
    let decimals: Vec<Option<usize>> = column.iter().map(|c| after_point(c)).collect();
    let Some(max) = decimals.iter().flatten().copied().max() else {
        return;
    };
    for (cell, after) in column.iter_mut().zip(decimals) {
        // An integer also needs room for the missing point.
        let pad = match after {
            Some(n) => max - n,
            None => max + 1,
        };
        cell.extend(std::iter::repeat(' ').take(pad));
    }
}

/// Format a float with `precision` significant digits, `%g` style
///
/// Fixed notation for exponents in `-4..precision`, scientific otherwise;
/// trailing zeros are dropped in both (`0.01`, `12.3457`, `1.5e-05`).
fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let precision = precision.max(1);
    // Round first, then read the exponent, so 9.999999 becomes 10 not 9.99999e0.
    let sci = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return value.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return value.to_string();
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
