//! TCP connector implementation.
//!
//! Performs a plain TCP connect using the operating system's socket API and
//! times the handshake. No data is exchanged; the connection is torn down as
//! soon as it is established.

use crate::scanner::traits::{Connector, ProbeOutcome, UnreachableReason};
use async_trait::async_trait;
use socket2::SockRef;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Connects with `TcpStream::connect` under a `tokio::time::timeout`.
///
/// Does not require elevated privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }

    /// Close an established probe connection with an RST instead of a FIN,
    /// so large scans do not leave a trail of `TIME_WAIT` sockets behind.
    fn release(stream: TcpStream) {
        if let Err(e) = SockRef::from(&stream).set_linger(Some(Duration::ZERO)) {
            trace!("set_linger failed: {}", e);
        }
        drop(stream);
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddr, limit: Duration) -> ProbeOutcome {
        let start = Instant::now();

        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                let elapsed = start.elapsed();
                Self::release(stream);
                ProbeOutcome::success(elapsed)
            }
            Ok(Err(e)) => ProbeOutcome::from_io_error(&e),
            Err(_) => ProbeOutcome::unreachable(UnreachableReason::TimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let outcome = TcpConnector::new()
            .connect(addr, Duration::from_secs(1))
            .await;

        let latency = outcome.latency_ms().expect("listener should accept");
        assert!(latency >= 0.0);
    }

    #[tokio::test]
    async fn test_connect_closed_port() {
        // Bind then drop to get a port that is very likely closed.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let outcome = TcpConnector::new()
            .connect(addr, Duration::from_millis(200))
            .await;

        assert!(matches!(outcome, ProbeOutcome::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_connect_port_one_is_not_open() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1);
        let outcome = TcpConnector::new()
            .connect(addr, Duration::from_millis(100))
            .await;

        // Closed or filtered depending on the host firewall, never open.
        assert!(!outcome.is_success());
    }
}
