//! Homebrew bootstrap for macOS

use super::PackageManager;
use crate::error::{LauncherError, Result};
use crate::host::{CommandSpec, Host};
use crate::ui;

pub const HOMEBREW_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Where the installer puts brew when it is not on PATH yet.
const KNOWN_BREW_PATHS: [&str; 2] = [
    "/opt/homebrew/bin/brew", // Apple Silicon
    "/usr/local/bin/brew",    // Intel
];

/// Resolve the brew executable: PATH first, then the known install prefixes.
pub fn locate_brew<H: Host>(host: &H) -> Option<String> {
    if host.has_program("brew") {
        return Some("brew".to_string());
    }
    KNOWN_BREW_PATHS
        .iter()
        .find(|path| host.has_program(path))
        .map(|path| path.to_string())
}

/// `/bin/bash -c "$(curl -fsSL <install.sh>)"`, wrapped so the command
/// substitution happens in a shell.
pub fn homebrew_bootstrap_command() -> CommandSpec {
    CommandSpec::new("/bin/bash").args([
        "-c".to_string(),
        format!("/bin/bash -c \"$(curl -fsSL {HOMEBREW_INSTALL_URL})\""),
    ])
}

pub(super) async fn ensure_homebrew<H: Host>(host: &H) -> Result<PackageManager> {
    if let Some(brew) = locate_brew(host) {
        log::debug!("Homebrew found at {brew}");
        ui::success("Homebrew is installed");
        return Ok(PackageManager::Homebrew { brew });
    }

    ui::step("🍺 Installing Homebrew...");
    host.run(&homebrew_bootstrap_command())
        .await?
        .check("Homebrew installation")?;

    let brew = locate_brew(host).ok_or_else(|| LauncherError::MissingDependency {
        tool: "Homebrew".into(),
    })?;
    ui::success("Homebrew installed");
    Ok(PackageManager::Homebrew { brew })
}
