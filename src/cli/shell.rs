//! Shell subcommand implementation.
//!
//! Reads one text command per line from stdin and prints the reply a chat
//! user would receive, e.g. `端口扫描 example.com 20 25`.

use crate::config::ProbeSettings;
use crate::dispatch::Dispatcher;
use crate::error::CliResult;
use crate::output;
use clap::Parser;
use console::style;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Answer text commands read from stdin.
#[derive(Parser, Debug)]
pub struct ShellCommand {
    /// Do not print a prompt, even on a terminal
    #[arg(long)]
    pub no_prompt: bool,
}

impl ShellCommand {
    pub async fn execute(&self, settings: ProbeSettings, quiet: bool) -> CliResult<()> {
        let dispatcher = Dispatcher::from_settings(settings);
        let interactive = !self.no_prompt && !quiet && console::user_attended();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if interactive {
                print!("{} ", style(">").cyan().bold());
                std::io::stdout().flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            debug!("shell input: {}", line);
            output::print_reply(&dispatcher.handle(&line).await)?;
        }

        Ok(())
    }
}
