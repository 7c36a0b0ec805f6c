//! Tcping subcommand implementation.

use crate::config::ProbeSettings;
use crate::error::{CliResult, ProbeError};
use crate::output;
use crate::scanner::{TcpConnector, TcpPinger};
use crate::types::{parse_port, Port, ProbeTarget};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

/// Time a single TCP connection to a port.
#[derive(Parser, Debug)]
pub struct TcpingCommand {
    /// Host to connect to (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Port to connect to (defaults to the configured tcping port, 80)
    #[arg(value_name = "PORT", value_parser = parse_port)]
    pub port: Option<Port>,

    /// Connect timeout in milliseconds
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl TcpingCommand {
    pub async fn execute(&self, settings: &ProbeSettings) -> CliResult<()> {
        let target = ProbeTarget::new(&self.host, self.port).map_err(ProbeError::from)?;

        let timeout = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.tcp_ping_timeout());

        let pinger = TcpPinger::new(Arc::new(TcpConnector::new()))
            .with_default_port(settings.tcp_ping_port)
            .with_timeout(timeout);

        output::print_reply(&pinger.tcp_ping(&target).await)?;
        Ok(())
    }
}
