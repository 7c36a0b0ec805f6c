//! ICMP reachability probe.
//!
//! Sends one echo request via `surge-ping`. Opening an ICMP socket needs
//! either root, `CAP_NET_RAW`, or (on Linux) membership of
//! `net.ipv4.ping_group_range`; when none of those hold the probe reports an
//! `Error` outcome rather than pretending the host is down.

use crate::output::reply;
use crate::scanner::traits::{Connector, EchoProbe, ProbeOutcome, UnreachableReason};
use crate::types::{resolve_host, Port};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use tracing::{debug, info, warn};

/// Timeout of a single echo request.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(4);

const PAYLOAD: [u8; 56] = [0; 56];

/// Echo over ICMP (or ICMPv6) sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpEcho;

impl IcmpEcho {
    pub fn new() -> Self {
        Self
    }

    fn client_for(addr: IpAddr) -> std::io::Result<Client> {
        let config = match addr {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        Client::new(&config)
    }
}

#[async_trait]
impl EchoProbe for IcmpEcho {
    async fn echo(&self, addr: IpAddr, limit: Duration) -> ProbeOutcome {
        let client = match Self::client_for(addr) {
            Ok(client) => client,
            Err(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied && !is_root() {
                    warn!("ICMP socket not permitted; run as root or grant CAP_NET_RAW");
                }
                return ProbeOutcome::error(format!("icmp socket unavailable: {e}"));
            }
        };

        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(limit);

        let start = Instant::now();
        // The pinger enforces `limit` itself; the outer bound guards against
        // a reply future that never resolves.
        match tokio::time::timeout(limit, pinger.ping(PingSequence(0), &PAYLOAD)).await {
            Ok(Ok((_packet, rtt))) => {
                debug!("echo reply from {} after {:?}", addr, start.elapsed());
                ProbeOutcome::success(rtt)
            }
            Ok(Err(SurgeError::Timeout { .. })) | Err(_) => {
                ProbeOutcome::unreachable(UnreachableReason::TimedOut)
            }
            Ok(Err(SurgeError::IOError(e))) => ProbeOutcome::from_io_error(&e),
            Ok(Err(e)) => ProbeOutcome::error(e.to_string()),
        }
    }
}

/// TCP connect used in place of ICMP when echo sockets are unavailable.
struct Fallback {
    connector: Arc<dyn Connector>,
    port: Port,
}

/// Single-shot reachability prober.
pub struct Pinger<E> {
    echo: Arc<E>,
    timeout: Duration,
    fallback: Option<Fallback>,
}

impl<E: EchoProbe> Pinger<E> {
    pub fn new(echo: Arc<E>) -> Self {
        Self {
            echo,
            timeout: DEFAULT_PING_TIMEOUT,
            fallback: None,
        }
    }

    /// Set the echo timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe `port` over TCP when the echo mechanism itself fails.
    pub fn with_fallback(mut self, connector: Arc<dyn Connector>, port: Port) -> Self {
        self.fallback = Some(Fallback { connector, port });
        self
    }

    /// Resolve the host and send one echo request.
    pub async fn probe(&self, host: &str) -> ProbeOutcome {
        let ip = match resolve_host(host).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("ping {}: {}", host, e);
                return ProbeOutcome::error(e.to_string());
            }
        };

        let outcome = self.echo.echo(ip, self.timeout).await;
        let ProbeOutcome::Error { message } = &outcome else {
            return outcome;
        };

        warn!("ping {} ({}): echo failed: {}", host, ip, message);
        match &self.fallback {
            Some(fallback) => {
                info!(
                    "ping {}: using tcp connect to port {} instead of icmp",
                    host, fallback.port
                );
                let addr = SocketAddr::new(ip, fallback.port.as_u16());
                fallback.connector.connect(addr, self.timeout).await
            }
            None => outcome,
        }
    }

    /// Probe and render the reply.
    pub async fn ping(&self, host: &str) -> String {
        info!("ping {}", host);
        let outcome = self.probe(host).await;
        info!("ping {}: {}", host, outcome);
        reply::ping(&outcome)
    }
}

/// Check if running with root privileges.
fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TcpConnector;
    use tokio::net::TcpListener;

    struct FixedEcho(ProbeOutcome);

    #[async_trait]
    impl EchoProbe for FixedEcho {
        async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> ProbeOutcome {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let echo = FixedEcho(ProbeOutcome::unreachable(UnreachableReason::TimedOut));
        let pinger = Pinger::new(Arc::new(echo));

        assert_eq!(pinger.ping("192.0.2.1").await, "无法访问。");
    }

    #[tokio::test]
    async fn test_reachable_host() {
        let echo = FixedEcho(ProbeOutcome::success(Duration::from_millis(3)));
        let pinger = Pinger::new(Arc::new(echo));

        assert_eq!(pinger.ping("127.0.0.1").await, "可以访问，响应时间：3.00 ms");
    }

    #[tokio::test]
    async fn test_unavailable_echo_is_an_error_not_unreachable() {
        let echo = FixedEcho(ProbeOutcome::error("icmp socket unavailable"));
        let pinger = Pinger::new(Arc::new(echo));

        assert!(matches!(
            pinger.probe("127.0.0.1").await,
            ProbeOutcome::Error { .. }
        ));
        assert_eq!(
            pinger.ping("127.0.0.1").await,
            "进行 ping 测试时发生错误，请检查域名是否正确。"
        );
    }

    #[tokio::test]
    async fn test_tcp_fallback_when_echo_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let echo = FixedEcho(ProbeOutcome::error("icmp socket unavailable"));
        let pinger = Pinger::new(Arc::new(echo))
            .with_timeout(Duration::from_secs(1))
            .with_fallback(Arc::new(TcpConnector::new()), port);

        let reply = pinger.ping("127.0.0.1").await;
        assert!(reply.starts_with("可以访问，响应时间："), "{reply}");
    }

    #[tokio::test]
    async fn test_fallback_not_used_for_silent_hosts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let echo = FixedEcho(ProbeOutcome::unreachable(UnreachableReason::TimedOut));
        let pinger =
            Pinger::new(Arc::new(echo)).with_fallback(Arc::new(TcpConnector::new()), port);

        assert_eq!(pinger.ping("127.0.0.1").await, "无法访问。");
    }

    #[tokio::test]
    async fn test_invalid_host_is_an_error() {
        let echo = FixedEcho(ProbeOutcome::success(Duration::ZERO));
        let pinger = Pinger::new(Arc::new(echo));

        assert!(matches!(
            pinger.probe("not a host").await,
            ProbeOutcome::Error { .. }
        ));
    }
}
