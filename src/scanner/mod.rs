//! Scanner module - probes and the bounded concurrent port scanner.
//!
//! The individual probes (TCP connect, ICMP echo) live in submodules. This
//! module fans connector attempts out across a port range on the tokio
//! runtime, with a per-scan semaphore capping how many are in flight.

pub mod icmp;
pub mod latency;
pub mod tcp;
pub mod traits;

use crate::error::{ProbeError, ProbeResult};
use crate::types::{resolve_host, validate_host, Port, PortRange};
use indicatif::ProgressBar;
use serde::{Serialize, Serializer};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

pub use icmp::{IcmpEcho, Pinger, DEFAULT_PING_TIMEOUT};
pub use latency::{TcpPinger, DEFAULT_TCP_PING_PORT, DEFAULT_TCP_PING_TIMEOUT};
pub use tcp::TcpConnector;
pub use traits::{Connector, EchoProbe, ProbeOutcome, UnreachableReason};

/// Default number of simultaneously in-flight probes.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default timeout of each port probe.
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_millis(500);

/// Range scanned when a request names no bounds.
pub const DEFAULT_SCAN_START: Port = Port::from_const(1);
pub const DEFAULT_SCAN_END: Port = Port::from_const(1024);

/// A validated scan of one host over an inclusive port range.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    host: String,
    range: PortRange,
    concurrency_limit: usize,
    per_port_timeout: Duration,
}

impl ScanRequest {
    /// Build a request from raw port numbers.
    ///
    /// Both bounds must be valid ports (1-65535). `start > end` is accepted
    /// and describes an empty scan.
    pub fn new(host: impl Into<String>, start: u16, end: u16) -> ProbeResult<Self> {
        let start = Port::try_from(start)?;
        let end = Port::try_from(end)?;
        Self::for_range(host, PortRange::new(start, end))
    }

    pub fn for_range(host: impl Into<String>, range: PortRange) -> ProbeResult<Self> {
        let host = host.into();
        validate_host(&host)?;

        Ok(Self {
            host,
            range,
            concurrency_limit: DEFAULT_CONCURRENCY,
            per_port_timeout: DEFAULT_PORT_TIMEOUT,
        })
    }

    /// Set the maximum number of in-flight probes.
    pub fn with_concurrency(mut self, limit: usize) -> ProbeResult<Self> {
        if limit == 0 {
            return Err(ProbeError::InvalidConcurrency);
        }
        self.concurrency_limit = limit;
        Ok(self)
    }

    /// Set the timeout of each port probe.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_port_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn range(&self) -> PortRange {
        self.range
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn per_port_timeout(&self) -> Duration {
        self.per_port_timeout
    }

    /// Worst-case wall clock of the whole scan: every probe timing out.
    pub fn worst_case_duration(&self) -> Duration {
        let waves = self.range.len().div_ceil(self.concurrency_limit);
        self.per_port_timeout * u32::try_from(waves).unwrap_or(u32::MAX)
    }
}

/// Complete result of one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    open_ports: Vec<Port>,
    ports_scanned: usize,
    failed_probes: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    elapsed: Duration,
}

impl ScanResult {
    /// Assemble a result; open ports are sorted and deduplicated here, so
    /// the order in which probes completed never leaks out.
    pub fn new(
        mut open_ports: Vec<Port>,
        ports_scanned: usize,
        failed_probes: usize,
        elapsed: Duration,
    ) -> Self {
        open_ports.sort_unstable();
        open_ports.dedup();
        Self {
            open_ports,
            ports_scanned,
            failed_probes,
            elapsed,
        }
    }

    /// Open ports, ascending and duplicate-free.
    pub fn open_ports(&self) -> &[Port] {
        &self.open_ports
    }

    pub fn is_empty(&self) -> bool {
        self.open_ports.is_empty()
    }

    /// Number of probes issued.
    pub fn ports_scanned(&self) -> usize {
        self.ports_scanned
    }

    /// Probes that ended in `Error` or whose task died.
    pub fn failed_probes(&self) -> usize {
        self.failed_probes
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Bounded concurrent TCP port scanner.
pub struct PortScanner<C> {
    connector: Arc<C>,
}

impl<C> Clone for PortScanner<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<C: Connector> PortScanner<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self { connector }
    }

    /// Scan every port of the request and return the open ones.
    ///
    /// Closed ports and per-port failures are logged and left out; only a
    /// host that cannot be resolved fails the scan as a whole. Dropping the
    /// returned future aborts every probe still in flight.
    pub async fn scan(&self, request: &ScanRequest) -> ProbeResult<ScanResult> {
        self.run(request, None).await
    }

    /// Like [`scan`](Self::scan), ticking `progress` once per finished probe.
    pub async fn scan_with_progress(
        &self,
        request: &ScanRequest,
        progress: &ProgressBar,
    ) -> ProbeResult<ScanResult> {
        self.run(request, Some(progress)).await
    }

    async fn run(
        &self,
        request: &ScanRequest,
        progress: Option<&ProgressBar>,
    ) -> ProbeResult<ScanResult> {
        let range = request.range();
        if range.is_empty() {
            debug!("scan {}: empty range {}, nothing to probe", request.host(), range);
            return Ok(ScanResult::default());
        }

        info!(
            "scan {} ports {} ({} probes, {} at a time, {:?} each)",
            request.host(),
            range,
            range.len(),
            request.concurrency_limit(),
            request.per_port_timeout()
        );

        let start_time = Instant::now();
        let ip = resolve_host(request.host()).await?;

        // One semaphore per scan; a permit travels with each spawned probe.
        let semaphore = Arc::new(Semaphore::new(request.concurrency_limit()));
        let mut tasks = JoinSet::new();
        let mut tally = Tally::default();

        for port in range.iter() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                // Only reachable if the semaphore were closed, which it never is.
                break;
            };

            // Collect whatever finished while we waited for the permit.
            while let Some(joined) = tasks.try_join_next() {
                tally.record(joined, progress);
            }

            let connector = Arc::clone(&self.connector);
            let timeout = request.per_port_timeout();
            tasks.spawn(async move {
                let _permit = permit;
                (port, probe_port(connector.as_ref(), ip, port, timeout).await)
            });
            tally.issued += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            tally.record(joined, progress);
        }

        let result = tally.finish(start_time.elapsed());
        info!(
            "scan {} done: {} open, {} failed, {} probes in {:?}",
            request.host(),
            result.open_ports().len(),
            result.failed_probes(),
            result.ports_scanned(),
            result.elapsed()
        );
        Ok(result)
    }
}

/// One port probe. The outer timeout backs up the connector's own.
async fn probe_port<C: Connector>(
    connector: &C,
    ip: IpAddr,
    port: Port,
    timeout: Duration,
) -> ProbeOutcome {
    let addr = SocketAddr::new(ip, port.as_u16());
    match tokio::time::timeout(timeout, connector.connect(addr, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::unreachable(UnreachableReason::TimedOut),
    }
}

/// Running totals of a scan, owned by the task that drives the `JoinSet`.
#[derive(Default)]
struct Tally {
    open: Vec<Port>,
    issued: usize,
    failed: usize,
}

impl Tally {
    fn record(
        &mut self,
        joined: Result<(Port, ProbeOutcome), JoinError>,
        progress: Option<&ProgressBar>,
    ) {
        if let Some(pb) = progress {
            pb.inc(1);
        }

        match joined {
            Ok((port, ProbeOutcome::Success { latency_ms })) => {
                info!("port {} is open ({:.2} ms)", port, latency_ms);
                if let Some(pb) = progress {
                    pb.set_message(format!("found open port {port}"));
                }
                self.open.push(port);
            }
            Ok((port, ProbeOutcome::Unreachable { reason })) => {
                debug!("port {} is closed ({})", port, reason);
            }
            Ok((port, ProbeOutcome::Error { message })) => {
                warn!("port {} probe failed: {}", port, message);
                self.failed += 1;
            }
            Err(e) => {
                error!("port probe task died: {}", e);
                self.failed += 1;
            }
        }
    }

    fn finish(self, elapsed: Duration) -> ScanResult {
        ScanResult::new(self.open, self.issued, self.failed, elapsed)
    }
}
