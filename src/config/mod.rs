//! Configuration management for netprobe.
//!
//! Provides XDG-compliant settings storage for probe timeouts, scan
//! concurrency and the defaults of the text commands.

mod settings;

pub use settings::{Paths, ProbeSettings};
