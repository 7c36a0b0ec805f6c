//! Scan subcommand implementation.
//!
//! Handles the `netprobe scan <host> [start] [end]` command.

use crate::config::ProbeSettings;
use crate::error::{CliError, CliResult};
use crate::output::{self, reply, OutputFormat};
use crate::scanner::{PortScanner, ScanRequest, ScanResult, TcpConnector};
use crate::types::{parse_port, Port, PortRange};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Scan a host for open TCP ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Host to scan (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: String,

    /// First port of the range (defaults to 1)
    #[arg(value_name = "START", value_parser = parse_port)]
    pub start: Option<Port>,

    /// Last port of the range (defaults to 1024)
    #[arg(value_name = "END", value_parser = parse_port)]
    pub end: Option<Port>,

    /// Maximum number of probes in flight
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Per-port connect timeout in milliseconds
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Show a progress bar while scanning
    #[arg(long)]
    pub progress: bool,
}

impl ScanCommand {
    /// Build the scan request from arguments, falling back to settings.
    pub fn request(&self, settings: &ProbeSettings) -> CliResult<ScanRequest> {
        let range = PortRange::new(
            self.start.unwrap_or(settings.scan_default_start),
            self.end.unwrap_or(settings.scan_default_end),
        );
        let timeout = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.scan_port_timeout());

        let request = ScanRequest::for_range(&self.host, range)?
            .with_concurrency(self.concurrency.unwrap_or(settings.scan_concurrency))?
            .with_timeout(timeout);
        Ok(request)
    }

    /// Execute the scan command.
    pub async fn execute(
        &self,
        settings: &ProbeSettings,
        verbose: bool,
        quiet: bool,
    ) -> CliResult<()> {
        let request = self.request(settings)?;
        let plain = self.output == OutputFormat::Plain;

        if plain && !quiet && verbose {
            output::print_scan_header(&request);
        }

        let scanner = PortScanner::new(Arc::new(TcpConnector::new()));
        let progress = (self.progress && !quiet).then(|| progress_bar(&request));

        let scan = async {
            match &progress {
                Some(pb) => scanner.scan_with_progress(&request, pb).await,
                None => scanner.scan(&request).await,
            }
        };

        // Dropping the scan future on Ctrl-C aborts the in-flight probes.
        let outcome = tokio::select! {
            outcome = scan => outcome,
            _ = tokio::signal::ctrl_c() => {
                if let Some(pb) = &progress {
                    pb.abandon_with_message("interrupted");
                }
                return Err(CliError::Interrupted);
            }
        };

        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }

        // Unresolvable hosts have no reachable ports.
        let result = outcome.unwrap_or_else(|e| {
            warn!("scan of {} failed: {}", request.host(), e);
            ScanResult::default()
        });

        self.print_result(&result, verbose, quiet)
    }

    fn print_result(&self, result: &ScanResult, verbose: bool, quiet: bool) -> CliResult<()> {
        match self.output {
            OutputFormat::Plain => {
                output::print_reply(&reply::scan(result))?;
                if verbose && !quiet {
                    output::print_scan_summary(result)?;
                }
            }
            OutputFormat::Json => output::print_json(result)?,
        }
        Ok(())
    }
}

fn progress_bar(request: &ScanRequest) -> ProgressBar {
    let pb = ProgressBar::new(request.range().len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb
}
