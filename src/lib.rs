//! CodeLive installer and launcher
//!
//! Installs the prerequisites (Homebrew on macOS, Git, Node.js, pnpm), clones
//! and builds CodeLive under the home directory, and starts or stops its
//! backend/frontend server pair.

pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod host;
pub mod install;
pub mod menu;
pub mod platform;
pub mod port;
pub mod prerequisites;
pub mod prompt;
pub mod ui;

pub use config::LauncherConfig;
pub use context::LaunchContext;
pub use error::{LauncherError, Result};
pub use host::{Host, SystemHost};
pub use prompt::{Prompter, TerminalPrompter};
