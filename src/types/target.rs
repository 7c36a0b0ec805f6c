//! Probe targets and host resolution.
//!
//! A target is whatever the user typed: a DNS name or a literal IPv4/IPv6
//! address, optionally with a port. Resolution happens once per request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use super::port::Port;

/// A host (and optional port) named by a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeTarget {
    /// DNS name or literal address, as given.
    pub host: String,
    /// Port, when the probe needs one.
    pub port: Option<Port>,
}

impl ProbeTarget {
    /// Create a target after checking the host is syntactically usable.
    pub fn new(host: impl Into<String>, port: Option<Port>) -> Result<Self, TargetError> {
        let host = host.into();
        validate_host(&host)?;
        Ok(Self { host, port })
    }

    /// The target's port, or `default` if none was given.
    pub fn port_or(&self, default: Port) -> Port {
        self.port.unwrap_or(default)
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.port, self.host.parse::<IpAddr>()) {
            (Some(port), Ok(IpAddr::V6(_))) => write!(f, "[{}]:{}", self.host, port),
            (Some(port), _) => write!(f, "{}:{}", self.host, port),
            (None, _) => write!(f, "{}", self.host),
        }
    }
}

/// Error type for target validation and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid host: '{0}'")]
    InvalidHost(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// Reject hosts that are neither an IP literal nor a well-formed DNS name.
pub fn validate_host(host: &str) -> Result<(), TargetError> {
    if host.parse::<IpAddr>().is_ok() || is_valid_hostname(host) {
        Ok(())
    } else {
        Err(TargetError::InvalidHost(host.to_string()))
    }
}

/// Resolve a host to a single address.
///
/// Literal addresses are returned as-is without touching the resolver.
/// For names, the first IPv4 address wins, falling back to the first IPv6
/// address when the name has no A records.
pub async fn resolve_host(host: &str) -> Result<IpAddr, TargetError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    validate_host(host)?;

    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    let response = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(host.to_string(), e.to_string()))?;

    let ips: Vec<IpAddr> = response.iter().collect();
    ips.iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| ips.first())
        .copied()
        .ok_or_else(|| TargetError::NoAddressesFound(host.to_string()))
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        // Can only contain alphanumeric, hyphens and underscores (SRV-style names)
        if !label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return false;
        }
    }

    true
}
