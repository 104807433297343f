//! WebSocket Echo Stress Tester - Main CLI Application
//!
//! Hammers a WebSocket echo server with scripted exchanges from many
//! concurrent workers and reports correctness failures and latencies.

use clap::Parser;
use std::{error::Error, process};
use ws_echo_stress::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter},
};

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        reporter.report_error(&e);

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file and STRESS_* environment variables");
            eprintln!("  - --addr takes host:port, --scheme takes ws or wss");
            eprintln!("  - Timeouts are milliseconds between 1 and 300000");
        }
        AppError::Network(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check that the echo server is listening on the target address");
            eprintln!("  - Verify firewall settings");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout troubleshooting:");
            eprintln!("  - The server accepted connections but did not echo or close in time");
            eprintln!("  - Raise --receive-timeout or --close-timeout for slow servers");
        }
        AppError::TestExecution(_) => {
            eprintln!();
            eprintln!("Execution troubleshooting:");
            eprintln!("  - Rerun with --verbose to see every failed test");
            eprintln!("  - Raise --receive-timeout or --close-timeout for slow servers");
            eprintln!("  - Lower --concurrency if the server refuses connections");
        }
        _ => {}
    }
}
