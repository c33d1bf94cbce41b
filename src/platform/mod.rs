//! Host OS detection and package manager handling
//!
//! - macOS: Homebrew, bootstrapped from the official install script if absent
//! - Linux: apt-get or yum, package lists refreshed before use
//!
//! Both implementations are compiled everywhere; [`HostOs::current`] picks one
//! at runtime so each path stays testable on any machine.

mod linux;
mod macos;

use std::fmt;

use crate::error::Result;
use crate::host::{CommandSpec, Host};
use crate::prerequisites::Tool;

pub use macos::{HOMEBREW_INSTALL_URL, homebrew_bootstrap_command, locate_brew};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux,
    Unsupported(&'static str),
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "macos")] {
        const CURRENT_OS: HostOs = HostOs::MacOs;
    } else if #[cfg(target_os = "linux")] {
        const CURRENT_OS: HostOs = HostOs::Linux;
    } else {
        const CURRENT_OS: HostOs = HostOs::Unsupported(std::env::consts::OS);
    }
}

impl HostOs {
    pub fn current() -> Self {
        CURRENT_OS
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Unsupported(name) => *name,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageManager {
    /// `brew` is the resolved executable, which may not be on `PATH` yet
    /// right after a fresh install.
    Homebrew { brew: String },
    AptGet,
    Yum,
}

impl PackageManager {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Homebrew { .. } => "Homebrew",
            Self::AptGet => "apt-get",
            Self::Yum => "yum",
        }
    }

    fn program(&self) -> &str {
        match self {
            Self::Homebrew { brew } => brew,
            Self::AptGet => "apt-get",
            Self::Yum => "yum",
        }
    }

    /// System package managers run through sudo unless we already are root.
    fn command(&self, is_root: bool) -> CommandSpec {
        let cmd = CommandSpec::new(self.program());
        match self {
            Self::Homebrew { .. } => cmd,
            Self::AptGet | Self::Yum if is_root => cmd,
            Self::AptGet | Self::Yum => cmd.elevated(),
        }
    }

    /// Command that refreshes package metadata, if this manager needs one.
    pub fn refresh_command(&self, is_root: bool) -> Option<CommandSpec> {
        match self {
            Self::Homebrew { .. } => None,
            Self::AptGet => Some(self.command(is_root).arg("update")),
            Self::Yum => Some(self.command(is_root).args(["makecache", "-y"])),
        }
    }

    /// Distribution package names providing `tool`.
    pub fn packages_for(&self, tool: Tool) -> &'static [&'static str] {
        match (self, tool) {
            (_, Tool::Git) => &["git"],
            (Self::Homebrew { .. }, Tool::Node) => &["node"],
            (Self::AptGet, Tool::Node) => &["nodejs", "npm"],
            (Self::Yum, Tool::Node) => &["nodejs"],
        }
    }

    pub fn install_command(&self, tool: Tool, is_root: bool) -> CommandSpec {
        let cmd = self.command(is_root).arg("install");
        let cmd = match self {
            Self::Homebrew { .. } => cmd,
            Self::AptGet | Self::Yum => cmd.arg("-y"),
        };
        cmd.args(self.packages_for(tool).iter().copied())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Make sure the OS package manager is usable.
///
/// Returns `None` when the host has none we know how to drive; that is not
/// an error by itself.
pub async fn ensure_package_manager<H: Host>(
    os: HostOs,
    host: &H,
) -> Result<Option<PackageManager>> {
    match os {
        HostOs::MacOs => macos::ensure_homebrew(host).await.map(Some),
        HostOs::Linux => linux::refresh_package_lists(host).await,
        HostOs::Unsupported(name) => {
            log::warn!("No package manager support for {name}");
            crate::ui::warn(&format!(
                "{name} is not supported for automatic dependency installation"
            ));
            Ok(None)
        }
    }
}
