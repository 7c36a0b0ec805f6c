//! Terminal output for the CLI.
//!
//! Replies are printed exactly as a chat user would receive them; the
//! decorations around them (headers, statistics) go through `console`.

use crate::scanner::{ScanRequest, ScanResult};
use console::style;
use std::io::{self, Write};

/// Print a reply string.
pub fn print_reply(reply: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", reply)
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(request: &ScanRequest) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("netprobe").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {}",
        style("•").dim(),
        style(request.host()).white().bold()
    );
    println!(
        "{} Scanning {} ports ({}), {} at a time, {} ms per port (at most {:.1}s)...",
        style("•").dim(),
        style(request.range().len()).white().bold(),
        request.range(),
        request.concurrency_limit(),
        request.per_port_timeout().as_millis(),
        request.worst_case_duration().as_secs_f64()
    );
    println!();
}

/// Print statistics after a scan.
pub fn print_scan_summary(result: &ScanResult) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        result.ports_scanned(),
        result.elapsed().as_secs_f64()
    )?;
    writeln!(
        out,
        "               {} open, {} failed",
        style(result.open_ports().len()).green().bold(),
        style(result.failed_probes()).yellow()
    )?;
    Ok(())
}

/// Print a scan result as pretty JSON.
pub fn print_json(result: &ScanResult) -> io::Result<()> {
    let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    print_reply(&json)
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
