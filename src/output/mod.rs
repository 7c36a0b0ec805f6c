//! Output formatting module.
//!
//! `reply` turns probe outcomes into the strings users receive; `plain`
//! prints them (and scan statistics) on a terminal.

mod plain;
pub mod reply;

pub use plain::{
    print_error, print_info, print_json, print_reply, print_scan_header, print_scan_summary,
};

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// The reply string, as a chat user would see it
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}
