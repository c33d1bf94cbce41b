//! Recording host and scripted prompter shared by the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use codelive_launcher::host::{
    BackgroundProcess, CapturedOutput, CommandSpec, CommandStatus, Host,
};
use codelive_launcher::{LauncherConfig, LauncherError, Prompter, Result};

/// What the fake saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Run(String),
    Capture(String),
    Spawn(String),
    Terminate(u32),
}

#[derive(Default)]
pub struct FakeHost {
    programs: RefCell<HashSet<String>>,
    /// Command line prefix → exit code for commands that should fail.
    failures: HashMap<String, i32>,
    /// Command line → program that appears on PATH once it ran.
    provides: HashMap<String, String>,
    lsof_stdout: String,
    pub offline: bool,
    pub root: bool,
    /// Path whose existence is sampled every time `git` runs.
    pub watch_path: Option<PathBuf>,
    pub watch_samples: RefCell<Vec<bool>>,
    pub events: RefCell<Vec<Event>>,
    pub cwds: RefCell<Vec<Option<PathBuf>>>,
    /// Port a spawned backend starts listening on.
    pub backend_port: Option<u16>,
    listeners: RefCell<Vec<std::net::TcpListener>>,
}

impl FakeHost {
    /// Host with every tool the install needs already present.
    pub fn with_everything() -> Self {
        Self::with_programs(&["git", "node", "npm", "pnpm", "lsof", "apt-get", "brew"])
    }

    pub fn with_programs(programs: &[&str]) -> Self {
        Self {
            programs: RefCell::new(programs.iter().map(|p| p.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn fail(mut self, command_prefix: &str, code: i32) -> Self {
        self.failures.insert(command_prefix.to_string(), code);
        self
    }

    pub fn provides(mut self, command_line: &str, program: &str) -> Self {
        self.provides
            .insert(command_line.to_string(), program.to_string());
        self
    }

    pub fn listening(mut self, pids: &[u32]) -> Self {
        self.lsof_stdout = pids.iter().map(|p| format!("{p}\n")).collect();
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Command lines passed to `run`, in order.
    pub fn runs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn spawns(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Spawn(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Terminate(pid) => Some(pid),
                _ => None,
            })
            .collect()
    }

    fn status_for(&self, line: &str) -> CommandStatus {
        self.failures
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, code)| CommandStatus::failed(*code))
            .unwrap_or(CommandStatus::SUCCESS)
    }
}

impl Host for FakeHost {
    fn has_program(&self, program: &str) -> bool {
        self.programs.borrow().contains(program)
    }

    fn is_root(&self) -> bool {
        self.root
    }

    async fn run(&self, cmd: &CommandSpec) -> Result<CommandStatus> {
        let line = cmd.to_string();
        if cmd.program == "git"
            && let Some(path) = &self.watch_path
        {
            self.watch_samples.borrow_mut().push(path.exists());
        }
        self.events.borrow_mut().push(Event::Run(line.clone()));
        self.cwds.borrow_mut().push(cmd.cwd.clone());

        let status = self.status_for(&line);
        if status.success
            && let Some(program) = self.provides.get(&line)
        {
            self.programs.borrow_mut().insert(program.clone());
        }
        Ok(status)
    }

    async fn capture(&self, cmd: &CommandSpec) -> Result<CapturedOutput> {
        let line = cmd.to_string();
        self.events.borrow_mut().push(Event::Capture(line));
        let stdout = if cmd.program == "lsof" {
            self.lsof_stdout.clone()
        } else {
            String::new()
        };
        Ok(CapturedOutput {
            status: CommandStatus::SUCCESS,
            stdout,
        })
    }

    async fn spawn_background(&self, cmd: &CommandSpec) -> Result<BackgroundProcess> {
        let line = cmd.to_string();
        self.events.borrow_mut().push(Event::Spawn(line.clone()));
        self.cwds.borrow_mut().push(cmd.cwd.clone());
        if let Some(port) = self.backend_port {
            let listener = std::net::TcpListener::bind(("127.0.0.1", port)).map_err(|source| {
                LauncherError::Spawn {
                    program: cmd.program.clone(),
                    source,
                }
            })?;
            self.listeners.borrow_mut().push(listener);
        }
        Ok(BackgroundProcess::untracked(line))
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        self.events.borrow_mut().push(Event::Terminate(pid));
        Ok(())
    }

    async fn is_reachable(&self, _url: &str, _timeout: Duration) -> bool {
        !self.offline
    }
}

/// Hands out pre-recorded answers; running dry is a prompt error.
#[derive(Default)]
pub struct ScriptedPrompter {
    confirms: RefCell<VecDeque<bool>>,
    lines: RefCell<VecDeque<String>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn confirming(answers: &[bool]) -> Self {
        Self {
            confirms: RefCell::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn typing(lines: &[&str]) -> Self {
        Self {
            lines: RefCell::new(lines.iter().map(|l| l.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn remaining_lines(&self) -> usize {
        self.lines.borrow().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.borrow_mut().push(message.to_string());
        self.confirms
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LauncherError::Prompt("no scripted answer".into()))
    }

    fn read_line(&self, message: &str) -> Result<String> {
        self.asked.borrow_mut().push(message.to_string());
        self.lines
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LauncherError::Prompt("no scripted input".into()))
    }
}

/// Config rooted in a scratch directory.
pub fn scratch_config(root: &std::path::Path) -> LauncherConfig {
    LauncherConfig {
        install_dir: root.join("codelive"),
        ready_timeout_secs: 5,
        ..LauncherConfig::default()
    }
}

/// A port nothing listens on right now.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// `sh -c <script>` as a configured server command.
pub fn sh(script: &str) -> Vec<String> {
    ["sh", "-c", script].map(String::from).to_vec()
}

/// Wait for a pid file written by a test backend.
#[cfg(unix)]
pub async fn read_pid_file(path: &std::path::Path) -> i32 {
    for _ in 0..100 {
        if let Ok(text) = std::fs::read_to_string(path)
            && let Ok(pid) = text.trim().parse()
        {
            return pid;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{} never appeared", path.display());
}

/// Whether `pid` is a live process. Zombies count as gone.
#[cfg(unix)]
pub fn is_alive(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if kill(Pid::from_raw(pid), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => !stat
            .rsplit_once(") ")
            .is_some_and(|(_, rest)| rest.starts_with('Z')),
        Err(_) => true,
    }
}

/// Poll until `pid` is gone or two seconds pass.
#[cfg(unix)]
pub async fn exits_soon(pid: i32) -> bool {
    for _ in 0..40 {
        if !is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
