//! Access to the machine the launcher drives
//!
//! All external programs, process signals and network probes go through the
//! [`Host`] trait so the install and server flows can be exercised against a
//! recording implementation in tests. [`SystemHost`] is the real one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::{Child, Command};

use crate::error::{LauncherError, Result};

/// A program invocation: argv plus an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Build from a full argv; `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run the same command through `sudo`.
    pub fn elevated(self) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".into(),
            args,
            cwd: self.cwd,
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a foreground command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandStatus {
    pub const SUCCESS: Self = Self {
        success: true,
        code: Some(0),
    };

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }

    /// Turn a non-zero exit into [`LauncherError::StepFailed`] named after `step`.
    pub fn check(self, step: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(LauncherError::step(step, self.code))
        }
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub stdout: String,
}

/// Grace period between SIGTERM and SIGKILL when stopping a background group.
const STOP_GRACE: Duration = Duration::from_secs(3);

/// A server process started in the background.
///
/// On unix the child leads its own process group, so stopping it also takes
/// down whatever it forked (pnpm runs the actual server as a grandchild).
/// Dropping the handle without [`stop`](Self::stop) SIGKILLs the group.
#[derive(Debug)]
pub struct BackgroundProcess {
    label: String,
    child: Option<Child>,
    /// Process group id, equal to the child's pid at spawn time.
    group: Option<u32>,
}

impl BackgroundProcess {
    pub fn new(label: impl Into<String>, child: Child) -> Self {
        let group = child.id();
        Self {
            label: label.into(),
            child: Some(child),
            group,
        }
    }

    /// Handle with no OS process behind it.
    pub fn untracked(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            child: None,
            group: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Exit status if the process has already ended.
    pub fn try_exited(&mut self) -> Option<CommandStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(status) => status.map(CommandStatus::from),
            Err(e) => {
                warn!("Could not poll {}: {e}", self.label);
                None
            }
        }
    }

    /// SIGTERM the whole group, give it [`STOP_GRACE`] to exit, then SIGKILL
    /// whatever is left. The group is signalled even if the direct child
    /// already exited, since its descendants may still hold the port.
    pub async fn stop(mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let group = self.group.take();
        debug!("Stopping background {}", self.label);

        #[cfg(unix)]
        {
            if let Some(group) = group {
                use nix::sys::signal::Signal;

                signal_group(group, Signal::SIGTERM);
                if tokio::time::timeout(STOP_GRACE, child.wait()).await.is_err() {
                    warn!("{} ignored SIGTERM, killing it", self.label);
                }
                signal_group(group, Signal::SIGKILL);
                let _ = child.wait().await;
                return;
            }
        }

        #[cfg(not(unix))]
        let _ = group;
        if let Err(e) = child.kill().await {
            warn!("Failed to stop {}: {e}", self.label);
        }
    }
}

impl Drop for BackgroundProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if self.child.is_some()
                && let Some(group) = self.group.take()
            {
                signal_group(group, nix::sys::signal::Signal::SIGKILL);
            }
        }
    }
}

/// Signal every process in group `group`; a group that is already gone is fine.
#[cfg(unix)]
fn signal_group(group: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(group) else {
        return;
    };
    match nix::sys::signal::killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to send {signal:?} to process group {group}: {e}"),
    }
}

/// Everything the launcher needs from the operating system.
#[allow(async_fn_in_trait)]
pub trait Host {
    /// Whether `program` resolves on `PATH`.
    fn has_program(&self, program: &str) -> bool;

    fn is_root(&self) -> bool;

    /// Run to completion with inherited stdio.
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandStatus>;

    /// Run to completion capturing stdout.
    async fn capture(&self, cmd: &CommandSpec) -> Result<CapturedOutput>;

    async fn spawn_background(&self, cmd: &CommandSpec) -> Result<BackgroundProcess>;

    /// Ask process `pid` to exit (SIGTERM).
    fn terminate(&self, pid: u32) -> Result<()>;

    /// Whether `url` answers an HTTP HEAD within `timeout`.
    async fn is_reachable(&self, url: &str, timeout: Duration) -> bool;
}

/// The real machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn is_root(&self) -> bool {
        #[cfg(unix)]
        {
            nix::unistd::getuid().is_root()
        }

        #[cfg(not(unix))]
        {
            false
        }
    }

    async fn run(&self, cmd: &CommandSpec) -> Result<CommandStatus> {
        debug!("Running: {cmd}");
        let status = cmd
            .to_command()
            .stdin(Stdio::inherit())
            .status()
            .await
            .map_err(|source| LauncherError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;
        debug!("{} exited with {:?}", cmd.program, status.code());
        Ok(status.into())
    }

    async fn capture(&self, cmd: &CommandSpec) -> Result<CapturedOutput> {
        debug!("Capturing: {cmd}");
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| LauncherError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;
        Ok(CapturedOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    async fn spawn_background(&self, cmd: &CommandSpec) -> Result<BackgroundProcess> {
        debug!("Spawning in background: {cmd}");
        let mut command = cmd.to_command();
        command.stdin(Stdio::null()).kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let child = command
            .spawn()
            .map_err(|source| LauncherError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;
        Ok(BackgroundProcess::new(cmd.to_string(), child))
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            let raw = i32::try_from(pid).map_err(|_| LauncherError::Terminate {
                pid,
                reason: "pid out of range".into(),
            })?;
            debug!("Sending SIGTERM to {pid}");
            kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(|e| LauncherError::Terminate {
                pid,
                reason: e.to_string(),
            })
        }

        #[cfg(not(unix))]
        {
            Err(LauncherError::Terminate {
                pid,
                reason: "process signals are not supported on this platform".into(),
            })
        }
    }

    async fn is_reachable(&self, url: &str, timeout: Duration) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("codelive-launcher/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build HTTP client: {e}");
                return false;
            }
        };

        match client.head(url).send().await {
            Ok(response) => {
                debug!("{url} answered {}", response.status());
                true
            }
            Err(e) => {
                debug!("{url} unreachable: {e}");
                false
            }
        }
    }
}
