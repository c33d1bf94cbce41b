//! Git, Node.js and pnpm
//!
//! Each tool is probed on PATH, installed if missing, and probed again. A tool
//! that is still missing after the install attempt aborts the flow.

use std::fmt;

use log::{info, warn};

use crate::error::{LauncherError, Result};
use crate::host::{CommandSpec, Host};
use crate::platform::{self, HostOs, PackageManager};
use crate::ui;

/// Tools installed through the OS package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Git,
    Node,
}

impl Tool {
    /// Executable whose presence means the tool is installed.
    pub fn binary(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Node => "node",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Git => "Git",
            Self::Node => "Node.js",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub async fn ensure_tool<H: Host>(
    tool: Tool,
    manager: Option<&PackageManager>,
    host: &H,
) -> Result<()> {
    if host.has_program(tool.binary()) {
        info!("{tool} already installed");
        ui::success(&format!("{tool} is installed"));
        return Ok(());
    }

    let missing = || LauncherError::MissingDependency {
        tool: tool.display_name().to_string(),
    };
    let manager = manager.ok_or_else(missing)?;

    ui::step(&format!("📥 Installing {tool} via {manager}..."));
    let status = host.run(&manager.install_command(tool, host.is_root())).await?;
    if !status.success {
        warn!("{manager} exited with {:?} while installing {tool}", status.code);
    }

    if !host.has_program(tool.binary()) {
        return Err(missing());
    }
    ui::success(&format!("{tool} installed"));
    Ok(())
}

/// pnpm comes from npm rather than the OS package manager.
pub async fn ensure_pnpm<H: Host>(host: &H) -> Result<()> {
    if host.has_program("pnpm") {
        info!("pnpm already installed");
        return Ok(());
    }

    ui::step("📥 Installing pnpm...");
    host.run(&CommandSpec::new("npm").args(["install", "-g", "pnpm"]))
        .await?
        .check("npm install -g pnpm")?;

    if !host.has_program("pnpm") {
        return Err(LauncherError::MissingDependency {
            tool: "pnpm".into(),
        });
    }
    ui::success("pnpm installed");
    Ok(())
}

/// Package manager, then Git and Node.js.
pub async fn ensure_prerequisites<H: Host>(os: HostOs, host: &H) -> Result<()> {
    ui::step(&format!("🔍 Checking prerequisites on {os}..."));
    let manager = platform::ensure_package_manager(os, host).await?;
    ensure_tool(Tool::Git, manager.as_ref(), host).await?;
    ensure_tool(Tool::Node, manager.as_ref(), host).await?;
    Ok(())
}
