//! Config subcommand implementation.

use crate::config::{Paths, ProbeSettings};
use crate::error::{CliResult, ConfigError};
use crate::output;
use clap::Parser;
use std::path::Path;

/// Show the effective settings, or write the defaults to disk.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Write the default settings file (overwrites an existing one)
    #[arg(long)]
    pub init: bool,
}

impl ConfigCommand {
    pub fn execute(&self, path: Option<&Path>, quiet: bool) -> CliResult<()> {
        let file = match path {
            Some(p) => p.to_path_buf(),
            None => Paths::discover()?.settings_file(),
        };

        if self.init {
            ProbeSettings::default().save_to(&file)?;
            if !quiet {
                output::print_info(&format!("Wrote default settings to {}", file.display()));
            }
        }

        let settings = if file.exists() {
            ProbeSettings::load_from(&file)?
        } else {
            ProbeSettings::default()
        };

        let json = serde_json::to_string_pretty(&settings).map_err(ConfigError::from)?;
        output::print_reply(&json)?;
        Ok(())
    }
}
