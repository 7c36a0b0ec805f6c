//! Probe settings and paths.
//!
//! Settings live in an XDG-compliant config directory as JSON. Every field
//! has a default, so a missing file or a partial file both work.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{
    DEFAULT_CONCURRENCY, DEFAULT_PING_TIMEOUT, DEFAULT_PORT_TIMEOUT, DEFAULT_SCAN_END,
    DEFAULT_SCAN_START, DEFAULT_TCP_PING_PORT, DEFAULT_TCP_PING_TIMEOUT,
};
use crate::types::Port;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netprobe)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform configuration directory.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "netprobe", "netprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Tunables of the probes and defaults of the text commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Maximum in-flight probes per scan.
    pub scan_concurrency: usize,
    /// Timeout of each port probe in milliseconds.
    pub scan_port_timeout_ms: u64,
    /// First port scanned when a scan command names none.
    pub scan_default_start: Port,
    /// Last port scanned when a scan command names none.
    pub scan_default_end: Port,
    /// Port probed by tcping when none is given.
    pub tcp_ping_port: Port,
    /// Timeout of a tcping attempt in milliseconds.
    pub tcp_ping_timeout_ms: u64,
    /// Timeout of an echo request in milliseconds.
    pub ping_timeout_ms: u64,
    /// TCP port probed instead when ICMP sockets are unavailable.
    pub ping_fallback_port: Option<Port>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            scan_concurrency: DEFAULT_CONCURRENCY,
            scan_port_timeout_ms: millis(DEFAULT_PORT_TIMEOUT),
            scan_default_start: DEFAULT_SCAN_START,
            scan_default_end: DEFAULT_SCAN_END,
            tcp_ping_port: DEFAULT_TCP_PING_PORT,
            tcp_ping_timeout_ms: millis(DEFAULT_TCP_PING_TIMEOUT),
            ping_timeout_ms: millis(DEFAULT_PING_TIMEOUT),
            ping_fallback_port: None,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl ProbeSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject settings no probe could run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scan_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        let timeouts = [
            ("scan_port_timeout_ms", self.scan_port_timeout_ms),
            ("tcp_ping_timeout_ms", self.tcp_ping_timeout_ms),
            ("ping_timeout_ms", self.ping_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn scan_port_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_port_timeout_ms)
    }

    pub fn tcp_ping_timeout(&self) -> Duration {
        Duration::from_millis(self.tcp_ping_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}
