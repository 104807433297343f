//! Colored formatter implementation with terminal color support
//!
//! Wraps the plain formatter and adds ANSI colors keyed to the latency
//! performance level and to success/failure counts.

use crate::{
    error::Result,
    executor::DriverReport,
    stats::StatsSnapshot,
    types::PerformanceLevel,
};
use super::formatter::{
    format_duration, format_percentage, latency_row, FormattingOptions, OutputFormatter, PlainFormatter, RowData,
};
use colored::*;

/// Color for a latency performance level
pub fn performance_color(level: PerformanceLevel) -> Color {
    match level {
        PerformanceLevel::Excellent => Color::Green,
        PerformanceLevel::Good => Color::Cyan,
        PerformanceLevel::Fair => Color::Yellow,
        PerformanceLevel::Poor => Color::Red,
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options),
            color_scheme: ColorScheme::default(),
        }
    }

    /// Create with a custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options),
            color_scheme,
        }
    }

    fn success_rate_color(&self, rate: f64) -> Color {
        if rate >= 99.0 {
            self.color_scheme.success
        } else if rate >= 90.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        }
    }

    fn failures_text(&self, failures: u64) -> ColoredString {
        let text = failures.to_string();
        if failures == 0 {
            text.color(self.color_scheme.muted)
        } else {
            text.color(self.color_scheme.error).bold()
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "=".repeat(title.len() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            border.color(self.color_scheme.header),
            title.color(self.color_scheme.header).bold(),
            border.color(self.color_scheme.header)
        ))
    }

    fn format_progress(&self, snapshot: &StatsSnapshot) -> Result<String> {
        let full = match snapshot.full_roundtrip {
            Some(s) => {
                let color = performance_color(s.performance_level());
                format!(
                    "avg {} p99 {}",
                    format_duration(s.avg_ms).color(color),
                    format_duration(s.p99_ms).color(color)
                )
            }
            None => "no successful tests yet".color(self.color_scheme.muted).to_string(),
        };

        Ok(format!(
            "[{}] {} ok, {} failed ({} success, {:.1} tests/s) | full roundtrip {}",
            format_duration(snapshot.elapsed.as_secs_f64() * 1000.0).color(self.color_scheme.muted),
            snapshot.successes.to_string().color(self.color_scheme.success),
            self.failures_text(snapshot.failures),
            format_percentage(snapshot.success_rate).color(self.success_rate_color(snapshot.success_rate)),
            snapshot.tests_per_second,
            full
        ))
    }

    fn format_latency_table(&self, snapshot: &StatsSnapshot) -> Result<String> {
        if snapshot.successes == 0 {
            return Ok("No successful tests recorded.".color(self.color_scheme.muted).to_string());
        }

        let rows: Vec<RowData> = snapshot
            .phases()
            .iter()
            .map(|(label, stats)| latency_row(label, *stats))
            .collect();
        let table = self
            .plain_formatter
            .create_table(&self.plain_formatter.latency_table_format(), &rows);

        // Tint each phase row by its average latency; borders and header stay plain
        let phases = snapshot.phases();
        let lines: Vec<String> = table
            .lines()
            .map(|line| {
                let phase = phases
                    .iter()
                    .find(|(label, _)| line.trim_start_matches(['|', ' ']).starts_with(label));
                match phase {
                    Some((_, Some(stats))) => line.color(performance_color(stats.performance_level())).to_string(),
                    _ => line.to_string(),
                }
            })
            .collect();

        Ok(lines.join("\n"))
    }

    fn format_failure_breakdown(&self, snapshot: &StatsSnapshot) -> Result<String> {
        if snapshot.failures_by_category.is_empty() {
            return Ok("No failures.".color(self.color_scheme.success).to_string());
        }

        let mut lines = vec!["Failures by category:".color(self.color_scheme.error).bold().to_string()];
        for (category, count) in &snapshot.failures_by_category {
            lines.push(format!("  {:<18} {}", category.color(self.color_scheme.warning), count));
        }
        if self.plain_formatter.options().verbose_mode {
            if let Some(last) = &snapshot.last_failure {
                lines.push(format!("  Last failure: {}", last.color(self.color_scheme.muted)));
            }
        }

        Ok(lines.join("\n"))
    }

    fn format_final_report(&self, snapshot: &StatsSnapshot, report: &DriverReport) -> Result<String> {
        let rate_color = self.success_rate_color(report.success_rate());
        let mut lines = vec![
            self.format_header("WebSocket Echo Stress Test Results")?,
            String::new(),
            format!("Duration:         {}", format_duration(report.elapsed.as_secs_f64() * 1000.0)),
            format!("Workers:          {}", report.workers.len()),
            format!("Total Tests:      {}", report.total_iterations()),
            format!(
                "Successful:       {} ({})",
                report.successes().to_string().color(self.color_scheme.success),
                format_percentage(report.success_rate()).color(rate_color).bold()
            ),
            format!("Failed:           {}", self.failures_text(report.failures())),
            format!("Throughput:       {:.1} tests/s", report.tests_per_second()),
        ];
        if report.aborted_workers > 0 {
            lines.push(format!(
                "Aborted workers:  {}",
                report.aborted_workers.to_string().color(self.color_scheme.error)
            ));
        }
        lines.push(String::new());
        lines.push(self.format_latency_table(snapshot)?);
        lines.push(String::new());
        lines.push(self.format_failure_breakdown(snapshot)?);

        Ok(lines.join("\n"))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", "✗".color(self.color_scheme.error).bold(), error.color(self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", "⚠".color(self.color_scheme.warning).bold(), warning.color(self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", "✓".color(self.color_scheme.success).bold(), message.color(self.color_scheme.success)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsCollector;

    #[test]
    fn test_performance_colors() {
        assert_eq!(performance_color(PerformanceLevel::Excellent), Color::Green);
        assert_eq!(performance_color(PerformanceLevel::Poor), Color::Red);
    }

    #[test]
    fn test_messages_keep_text() {
        colored::control::set_override(false);
        let formatter = ColoredFormatter::new(FormattingOptions::default());

        assert!(formatter.format_error("boom").unwrap().contains("boom"));
        assert!(formatter.format_warning("careful").unwrap().contains("careful"));
        assert!(formatter.format_success("done").unwrap().contains("done"));
        assert!(formatter.format_header("Results").unwrap().contains("Results"));
    }

    #[test]
    fn test_empty_snapshot() {
        colored::control::set_override(false);
        let formatter = ColoredFormatter::new(FormattingOptions::default());
        let snapshot = StatsCollector::new(10).snapshot();

        assert!(formatter.format_latency_table(&snapshot).unwrap().contains("No successful tests"));
        assert!(formatter.format_failure_breakdown(&snapshot).unwrap().contains("No failures."));
        assert!(formatter.format_progress(&snapshot).unwrap().contains("0 ok"));
    }
}
