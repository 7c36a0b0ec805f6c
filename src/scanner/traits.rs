//! Probe outcome and the seams between probes and the network.
//!
//! `Connector` and `EchoProbe` abstract the single network operation each
//! prober performs, so the scanner and probers can be driven by
//! instrumented implementations in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Why a probe got no usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// The peer actively refused (RST for TCP).
    Refused,
    /// Nothing came back within the timeout.
    TimedOut,
    /// The connection was reset or aborted during setup.
    Reset,
    /// The host or network is unreachable from here.
    NoRoute,
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused => write!(f, "refused"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Reset => write!(f, "reset"),
            Self::NoRoute => write!(f, "no route"),
        }
    }
}

/// Result of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The target answered; `latency_ms` is the measured round trip.
    Success { latency_ms: f64 },
    /// Expected negative result: closed port, silent host.
    Unreachable { reason: UnreachableReason },
    /// The probe itself could not be carried out.
    Error { message: String },
}

impl ProbeOutcome {
    pub fn success(elapsed: Duration) -> Self {
        Self::Success {
            latency_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn unreachable(reason: UnreachableReason) -> Self {
        Self::Unreachable { reason }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Classify a failed connect or echo.
    ///
    /// Kinds that describe the remote end map to `Unreachable`; anything else
    /// is a local failure (permissions, descriptor exhaustion, ...) and maps to
    /// `Error`.
    pub fn from_io_error(err: &io::Error) -> Self {
        use io::ErrorKind::*;

        match err.kind() {
            ConnectionRefused => Self::unreachable(UnreachableReason::Refused),
            TimedOut => Self::unreachable(UnreachableReason::TimedOut),
            ConnectionReset | ConnectionAborted => Self::unreachable(UnreachableReason::Reset),
            HostUnreachable | NetworkUnreachable | NetworkDown => {
                Self::unreachable(UnreachableReason::NoRoute)
            }
            _ => Self::error(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Round trip in milliseconds, if the probe succeeded.
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            Self::Success { latency_ms } => Some(*latency_ms),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { latency_ms } => write!(f, "success ({latency_ms:.2} ms)"),
            Self::Unreachable { reason } => write!(f, "unreachable ({reason})"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// A single timeout-bounded TCP connection attempt.
///
/// Implementations open at most one connection per call, release it before
/// returning, and never take longer than `timeout`.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, addr: SocketAddr, timeout: Duration) -> ProbeOutcome;
}

/// A single echo request (ICMP or an equivalent).
#[async_trait]
pub trait EchoProbe: Send + Sync + 'static {
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> ProbeOutcome;
}
