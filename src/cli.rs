use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "codelive", version, about = "Install and launch CodeLive")]
pub struct Args {
    /// Run the non-interactive install and exit (same as `install`)
    #[arg(long)]
    pub install: bool,

    /// Path to a launcher config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Answer yes when asked to stop a running server
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Subcommands (menu, install, etc.)
    #[command(subcommand)]
    pub sub: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    /// Interactive menu (default if no subcommand)
    Menu,
    /// Check prerequisites, then clone and build CodeLive
    Install,
    /// Start the backend and frontend servers
    Start,
    /// Stop the server listening on the CodeLive port
    Stop,
    /// Show install location and whether the server is running
    Status,
    /// Get an API key
    ApiKey,
}

impl Args {
    /// Flag and subcommands collapse into one action; `--install` wins.
    pub fn command(&self) -> Cmd {
        if self.install {
            return Cmd::Install;
        }
        self.sub.unwrap_or(Cmd::Menu)
    }
}
