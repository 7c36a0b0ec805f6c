//! Core type definitions using newtype patterns for type safety.
//!
//! These types keep invalid ports and malformed hosts out of the probing
//! code: anything that reaches a connector has already been validated.

mod port;
mod target;

pub use port::{parse_port, Port, PortError, PortRange};
pub use target::{resolve_host, validate_host, ProbeTarget, TargetError};
