//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    executor::DriverReport,
    stats::{LatencyStatistics, StatsSnapshot},
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format a one-line periodic progress summary
    fn format_progress(&self, snapshot: &StatsSnapshot) -> Result<String>;

    /// Format the per-phase latency table
    fn format_latency_table(&self, snapshot: &StatsSnapshot) -> Result<String>;

    /// Format failure counts per error category
    fn format_failure_breakdown(&self, snapshot: &StatsSnapshot) -> Result<String>;

    /// Format the report printed when the run ends
    fn format_final_report(&self, snapshot: &StatsSnapshot, report: &DriverReport) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Enable verbose mode with detailed information
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    /// Column header
    pub header: String,
    /// Column alignment
    pub alignment: Alignment,
    /// Minimum width
    pub min_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Format duration in human-readable format
pub(crate) fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.2}μs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub(crate) fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Table cells for one latency phase
pub(crate) fn latency_row(label: &str, stats: Option<&LatencyStatistics>) -> RowData {
    match stats {
        Some(s) => vec![
            label.to_string(),
            format_duration(s.min_ms),
            format_duration(s.avg_ms),
            format_duration(s.p50_ms),
            format_duration(s.p90_ms),
            format_duration(s.p99_ms),
            format_duration(s.max_ms),
        ],
        None => {
            let mut row = vec![label.to_string()];
            row.extend(std::iter::repeat("N/A".to_string()).take(6));
            row
        }
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    pub(crate) fn latency_table_format(&self) -> TableFormat {
        TableFormat {
            columns: vec![
                Column::new("Phase", Alignment::Left, 15),
                Column::new("Min", Alignment::Right, 8),
                Column::new("Avg", Alignment::Right, 8),
                Column::new("P50", Alignment::Right, 8),
                Column::new("P90", Alignment::Right, 8),
                Column::new("P99", Alignment::Right, 8),
                Column::new("Max", Alignment::Right, 8),
            ],
            show_borders: self.options.table_borders,
        }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&widths));
            output.push('\n');
        }

        let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
        output.push_str(&self.create_row(&headers, &widths, format));
        output.push('\n');

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&widths));
            output.push('\n');
        }

        for row in rows {
            output.push_str(&self.create_row(row, &widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&widths));
        }

        output.trim_end().to_string()
    }

    /// Calculate optimal column widths
    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                rows.iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(col.min_width.max(col.header.len()), usize::max)
            })
            .collect()
    }

    /// Create a table row
    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map_or(Alignment::Left, |c| c.alignment);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&self.align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    /// Create horizontal border for table
    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    /// Align text within specified width
    fn align_text(&self, text: &str, width: usize, alignment: Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.to_string();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_progress(&self, snapshot: &StatsSnapshot) -> Result<String> {
        let full = snapshot
            .full_roundtrip
            .map(|s| format!("avg {} p99 {}", format_duration(s.avg_ms), format_duration(s.p99_ms)))
            .unwrap_or_else(|| "no successful tests yet".to_string());

        Ok(format!(
            "[{}] {} ok, {} failed ({} success, {:.1} tests/s) | full roundtrip {}",
            format_duration(snapshot.elapsed.as_secs_f64() * 1000.0),
            snapshot.successes,
            snapshot.failures,
            format_percentage(snapshot.success_rate),
            snapshot.tests_per_second,
            full
        ))
    }

    fn format_latency_table(&self, snapshot: &StatsSnapshot) -> Result<String> {
        if snapshot.successes == 0 {
            return Ok("No successful tests recorded.".to_string());
        }

        let rows: Vec<RowData> = snapshot
            .phases()
            .iter()
            .map(|(label, stats)| latency_row(label, *stats))
            .collect();

        Ok(self.create_table(&self.latency_table_format(), &rows))
    }

    fn format_failure_breakdown(&self, snapshot: &StatsSnapshot) -> Result<String> {
        if snapshot.failures_by_category.is_empty() {
            return Ok("No failures.".to_string());
        }

        let mut output = String::new();
        writeln!(output, "Failures by category:").map_err(fmt_err)?;
        for (category, count) in &snapshot.failures_by_category {
            writeln!(output, "  {:<18} {}", category, count).map_err(fmt_err)?;
        }
        if self.options.verbose_mode {
            if let Some(last) = &snapshot.last_failure {
                writeln!(output, "  Last failure: {}", last).map_err(fmt_err)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_final_report(&self, snapshot: &StatsSnapshot, report: &DriverReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header("WebSocket Echo Stress Test Results")?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;
        writeln!(output, "Duration:         {}", format_duration(report.elapsed.as_secs_f64() * 1000.0)).map_err(fmt_err)?;
        writeln!(output, "Workers:          {}", report.workers.len()).map_err(fmt_err)?;
        writeln!(output, "Total Tests:      {}", report.total_iterations()).map_err(fmt_err)?;
        writeln!(output, "Successful:       {} ({})", report.successes(), format_percentage(report.success_rate())).map_err(fmt_err)?;
        writeln!(output, "Failed:           {}", report.failures()).map_err(fmt_err)?;
        writeln!(output, "Throughput:       {:.1} tests/s", report.tests_per_second()).map_err(fmt_err)?;
        if report.aborted_workers > 0 {
            writeln!(output, "Aborted workers:  {}", report.aborted_workers).map_err(fmt_err)?;
        }
        writeln!(output).map_err(fmt_err)?;
        writeln!(output, "{}", self.format_latency_table(snapshot)?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;
        write!(output, "{}", self.format_failure_breakdown(snapshot)?).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
