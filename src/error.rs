//! Error taxonomy for the launcher
//!
//! Every failure aborts the current flow; nothing is retried or rolled back.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    /// Tool still absent after an install attempt (or no way to install it)
    #[error("{tool} is not installed and could not be installed automatically")]
    MissingDependency { tool: String },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CodeLive is not installed at {} (run the install step first)", path.display())]
    NotInstalled { path: PathBuf },

    #[error("no internet connection (could not reach {url})")]
    Offline { url: String },

    #[error("an existing CodeLive server must be stopped before continuing")]
    Declined,

    #[error("{step} failed{}", code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    StepFailed { step: String, code: Option<i32> },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("port {port} is already in use{}; stop the running server first", pid_suffix(pids))]
    PortInUse { port: u16, pids: Vec<u32> },

    #[error("server did not start listening on port {port} within {secs} seconds")]
    ServerNotReady { port: u16, secs: u64 },

    #[error("failed to stop process {pid}: {reason}")]
    Terminate { pid: u32, reason: String },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LauncherError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn step(step: impl Into<String>, code: Option<i32>) -> Self {
        Self::StepFailed {
            step: step.into(),
            code,
        }
    }
}

fn pid_suffix(pids: &[u32]) -> String {
    if pids.is_empty() {
        return String::new();
    }
    let list: Vec<String> = pids.iter().map(u32::to_string).collect();
    format!(" (pid {})", list.join(", "))
}

pub type Result<T, E = LauncherError> = std::result::Result<T, E>;
