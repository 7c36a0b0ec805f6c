//! Ping subcommand implementation.

use crate::config::ProbeSettings;
use crate::error::{CliResult, ProbeError};
use crate::output;
use crate::scanner::{Connector, IcmpEcho, Pinger, TcpConnector};
use crate::types::validate_host;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

/// Send one echo request and report the round trip.
#[derive(Parser, Debug)]
pub struct PingCommand {
    /// Host to ping (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Echo timeout in milliseconds
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl PingCommand {
    pub async fn execute(&self, settings: &ProbeSettings) -> CliResult<()> {
        validate_host(&self.host).map_err(ProbeError::from)?;

        let timeout = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.ping_timeout());

        let mut pinger = Pinger::new(Arc::new(IcmpEcho::new())).with_timeout(timeout);
        if let Some(port) = settings.ping_fallback_port {
            let connector: Arc<dyn Connector> = Arc::new(TcpConnector::new());
            pinger = pinger.with_fallback(connector, port);
        }

        output::print_reply(&pinger.ping(&self.host).await)?;
        Ok(())
    }
}
