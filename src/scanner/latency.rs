//! TCP latency probe ("tcping").
//!
//! Answers "does this host accept connections on this port, and how fast"
//! with a single connect attempt.

use crate::output::reply;
use crate::scanner::traits::{Connector, ProbeOutcome};
use crate::types::{resolve_host, Port, ProbeTarget};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Port used when a tcping request names none.
pub const DEFAULT_TCP_PING_PORT: Port = Port::from_const(80);

/// Timeout of a single tcping attempt.
pub const DEFAULT_TCP_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Single-shot TCP latency prober.
pub struct TcpPinger<C> {
    connector: Arc<C>,
    default_port: Port,
    timeout: Duration,
}

impl<C: Connector> TcpPinger<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self {
            connector,
            default_port: DEFAULT_TCP_PING_PORT,
            timeout: DEFAULT_TCP_PING_TIMEOUT,
        }
    }

    /// Set the port probed when the target names none.
    pub fn with_default_port(mut self, port: Port) -> Self {
        self.default_port = port;
        self
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the target and connect once.
    ///
    /// Resolution failures are reported as `Error`: the probe never got as
    /// far as the network.
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let port = target.port_or(self.default_port);

        let ip = match resolve_host(&target.host).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("tcping {}: {}", target.host, e);
                return ProbeOutcome::error(e.to_string());
            }
        };

        let addr = SocketAddr::new(ip, port.as_u16());
        let outcome = self.connector.connect(addr, self.timeout).await;

        if let ProbeOutcome::Error { message } = &outcome {
            warn!("tcping {} ({}) failed: {}", target.host, addr, message);
        }
        outcome
    }

    /// Probe and render the reply.
    pub async fn tcp_ping(&self, target: &ProbeTarget) -> String {
        info!(
            "tcping {} port {}",
            target.host,
            target.port_or(self.default_port)
        );
        let outcome = self.probe(target).await;
        info!("tcping {}: {}", target.host, outcome);
        reply::tcp_ping(&outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{TcpConnector, UnreachableReason};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Records the addresses it is asked to connect to.
    #[derive(Default)]
    struct RecordingConnector {
        seen: Mutex<Vec<SocketAddr>>,
    }

    #[async_trait]
    impl Connector for RecordingConnector {
        async fn connect(&self, addr: SocketAddr, _timeout: Duration) -> ProbeOutcome {
            self.seen.lock().unwrap().push(addr);
            ProbeOutcome::unreachable(UnreachableReason::Refused)
        }
    }

    #[tokio::test]
    async fn test_tcp_ping_listening_service() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port());

        let pinger = TcpPinger::new(Arc::new(TcpConnector::new()));
        let target = ProbeTarget::new("127.0.0.1", port).unwrap();
        let reply = pinger.tcp_ping(&target).await;

        assert!(reply.starts_with("TCP连接成功，响应时间："), "{reply}");
        let latency: f64 = reply
            .trim_start_matches("TCP连接成功，响应时间：")
            .trim_end_matches(" ms")
            .parse()
            .unwrap();
        assert!(latency >= 0.0);
    }

    #[tokio::test]
    async fn test_default_port_is_80() {
        let connector = Arc::new(RecordingConnector::default());
        let pinger = TcpPinger::new(Arc::clone(&connector));
        let target = ProbeTarget::new("127.0.0.1", None).unwrap();

        let reply = pinger.tcp_ping(&target).await;

        assert_eq!(reply, "无法连接到指定的端口。");
        let seen = connector.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].port(), 80);
    }

    #[tokio::test]
    async fn test_connector_error_is_generic_reply() {
        struct Failing;

        #[async_trait]
        impl Connector for Failing {
            async fn connect(&self, _addr: SocketAddr, _timeout: Duration) -> ProbeOutcome {
                ProbeOutcome::error("Too many open files (os error 24)")
            }
        }

        let pinger = TcpPinger::new(Arc::new(Failing));
        let target = ProbeTarget::new("127.0.0.1", Port::new(8080)).unwrap();
        let reply = pinger.tcp_ping(&target).await;

        assert_eq!(reply, "进行 TCP 测试时发生错误，请检查域名和端口。");
    }
}
