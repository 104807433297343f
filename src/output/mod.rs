//! Output formatting and display system
//!
//! This module provides the formatting for periodic progress lines and the
//! final load test report, in colored and plain text variants.

mod formatter;
mod colored;

pub use formatter::{
    OutputFormatter,
    PlainFormatter,
    TableFormat,
    FormattingOptions,
    Column,
    Alignment,
    RowData,
};
pub use colored::{
    ColoredFormatter,
    ColorScheme,
    performance_color,
};

use crate::{
    error::Result,
    executor::DriverReport,
    stats::StatsSnapshot,
};
use std::sync::Arc;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Arc<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Arc::new(ColoredFormatter::new(options))
        } else {
            Arc::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Arc<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}

/// Main output coordinator that handles all result display
#[derive(Clone)]
pub struct OutputCoordinator {
    formatter: Arc<dyn OutputFormatter>,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Arc<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &Arc<dyn OutputFormatter> {
        &self.formatter
    }

    /// Progress line for the periodic report
    pub fn display_progress(&self, snapshot: &StatsSnapshot) -> Result<String> {
        self.formatter.format_progress(snapshot)
    }

    /// Complete report for the end of the run
    pub fn display_final_report(&self, snapshot: &StatsSnapshot, report: &DriverReport) -> Result<String> {
        self.formatter.format_final_report(snapshot, report)
    }

    /// Display error message
    pub fn display_error(&self, error: &str) -> Result<String> {
        self.formatter.format_error(error)
    }

    /// Display warning message
    pub fn display_warning(&self, warning: &str) -> Result<String> {
        self.formatter.format_warning(warning)
    }

    /// Display success message
    pub fn display_success(&self, message: &str) -> Result<String> {
        self.formatter.format_success(message)
    }
}
