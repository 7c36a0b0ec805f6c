//! # netprobe - Reachability Probes and a Bounded Port Scanner
//!
//! netprobe answers three questions about a host: does it answer an ICMP
//! echo, how fast does it accept a TCP connection, and which ports in a
//! range are open.
//!
//! ## Features
//!
//! - **ICMP Ping**: One echo request with a timeout, optional TCP fallback
//! - **TCP Ping**: Connect latency to a single port (default 80)
//! - **Port Scanning**: Async TCP connect scan with a hard concurrency bound
//! - **Text Commands**: `ping`, `tcping`, `端口测试`, `端口扫描` answered as reply strings
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netprobe::scanner::{PortScanner, ScanRequest, TcpConnector};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = PortScanner::new(Arc::new(TcpConnector::new()));
//!     let request = ScanRequest::new("example.com", 20, 25)
//!         .unwrap()
//!         .with_concurrency(50)
//!         .unwrap();
//!
//!     let result = scanner.scan(&request).await.unwrap();
//!     println!("open: {:?}", result.open_ports());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port and target newtypes, host validation and resolution
//! - [`scanner`] - Probers and the `Connector`/`EchoProbe` seams they run on
//! - [`dispatch`] - Text command parsing and routing
//! - [`config`] - Persistent probe settings
//! - [`output`] - Reply strings and terminal output
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use dispatch::{Command, Dispatcher};
pub use error::{CliError, ConfigError, ProbeError};
pub use scanner::{
    Connector, EchoProbe, PortScanner, ProbeOutcome, ScanRequest, ScanResult, UnreachableReason,
};
pub use types::{Port, PortRange, ProbeTarget};
