//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `netprobe ping <host>` - ICMP reachability
//! - `netprobe tcping <host> [port]` - TCP connect latency
//! - `netprobe scan <host> [start] [end]` - Bounded concurrent port scan
//! - `netprobe shell` - Answer text commands read from stdin
//! - `netprobe config` - Show or initialise settings

mod config;
mod ping;
mod scan;
mod shell;
mod tcping;

pub use config::ConfigCommand;
pub use ping::PingCommand;
pub use scan::ScanCommand;
pub use shell::ShellCommand;
pub use tcping::TcpingCommand;

use crate::config::ProbeSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// netprobe - reachability probes and a bounded concurrent port scanner.
///
/// Answers the same questions as the chat commands `ping`, `tcping`,
/// `端口测试` and `端口扫描`, with the same replies.
#[derive(Parser, Debug)]
#[command(name = "netprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ping, tcping and port-scan hosts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a settings file (defaults to the XDG config directory)
    #[arg(long, global = true, value_name = "PATH", env = "NETPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one ICMP echo request
    Ping(PingCommand),

    /// Time one TCP connection
    #[command(alias = "tcp")]
    Tcping(TcpingCommand),

    /// Scan a port range for open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Read text commands from stdin and print replies
    Shell(ShellCommand),

    /// Show or initialise settings
    Config(ConfigCommand),
}

impl Cli {
    /// Load settings from `--config` or the default location.
    pub fn load_settings(&self) -> CliResult<ProbeSettings> {
        let settings = match &self.config {
            Some(path) => ProbeSettings::load_from(path)?,
            None => ProbeSettings::load()?,
        };
        Ok(settings)
    }

    /// Run the selected subcommand.
    pub async fn run(&self) -> CliResult<()> {
        if let Commands::Config(cmd) = &self.command {
            return cmd.execute(self.config.as_deref(), self.quiet);
        }

        let settings = self.load_settings()?;
        match &self.command {
            Commands::Ping(cmd) => cmd.execute(&settings).await,
            Commands::Tcping(cmd) => cmd.execute(&settings).await,
            Commands::Scan(cmd) => cmd.execute(&settings, self.verbose, self.quiet).await,
            Commands::Shell(cmd) => cmd.execute(settings, self.quiet).await,
            Commands::Config(_) => Ok(()),
        }
    }
}
