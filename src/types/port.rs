//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` is the inclusive span walked by the scanner; unlike a plain
//! `RangeInclusive` it tolerates `start > end` and treats it as empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None for port 0.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Port for a constant known to be non-zero; fails compilation otherwise
    /// when used in a `const` item.
    pub const fn from_const(port: u16) -> Self {
        match Self::new(port) {
            Some(port) => port,
            None => panic!("port 0 is not a valid port"),
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(u32::from(value)))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port(s)
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
}

/// Parse a decimal port number, distinguishing junk from out-of-range values.
pub fn parse_port(s: &str) -> Result<Port, PortError> {
    let s = s.trim();
    let value: u32 = s
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))?;

    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortError::OutOfRange(value))
}

/// An inclusive range of ports. `start > end` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Create a new port range.
    pub const fn new(start: Port, end: Port) -> Self {
        Self { start, end }
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        if self.start.0 > self.end.0 {
            0
        } else {
            (self.end.0 - self.start.0) as usize + 1
        }
    }

    /// True when `start > end`.
    pub const fn is_empty(&self) -> bool {
        self.start.0 > self.end.0
    }

    /// Iterate over all ports in this range, ascending.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_deserialize_validates() {
        assert_eq!(serde_json::from_str::<Port>("443").unwrap().as_u16(), 443);
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert!(serde_json::from_str::<Port>("70000").is_err());
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080").unwrap().as_u16(), 8080);
        assert_eq!(parse_port(" 22 ").unwrap().as_u16(), 22);
        assert_eq!(parse_port("0"), Err(PortError::OutOfRange(0)));
        assert_eq!(parse_port("70000"), Err(PortError::OutOfRange(70000)));
        assert!(matches!(parse_port("http"), Err(PortError::InvalidFormat(_))));
        assert!(matches!(parse_port("-1"), Err(PortError::InvalidFormat(_))));
    }

    #[test]
    fn test_port_range() {
        let start = Port::new(1).unwrap();
        let end = Port::new(100).unwrap();
        let range = PortRange::new(start, end);
        assert_eq!(range.len(), 100);
        assert!(!range.is_empty());
        assert_eq!(range.to_string(), "1-100");
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let range = PortRange::new(Port::new(100).unwrap(), Port::new(50).unwrap());
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn test_full_range_does_not_overflow() {
        let range = PortRange::new(Port::new(1).unwrap(), Port::new(65535).unwrap());
        assert_eq!(range.len(), 65535);
        assert_eq!(range.iter().last(), Port::new(65535));
    }

    #[test]
    fn test_single_range() {
        let port = Port::new(8080).unwrap();
        let range = PortRange::new(port, port);
        assert_eq!(range.len(), 1);
        assert_eq!(range.to_string(), "8080");
    }
}
