//! apt-get / yum handling for Linux

use super::PackageManager;
use crate::error::Result;
use crate::host::Host;
use crate::ui;

/// First supported package manager on PATH, apt-get preferred.
pub(super) fn detect<H: Host>(host: &H) -> Option<PackageManager> {
    if host.has_program("apt-get") {
        Some(PackageManager::AptGet)
    } else if host.has_program("yum") {
        Some(PackageManager::Yum)
    } else {
        None
    }
}

/// Refresh package lists. A host without apt-get or yum is left alone, and a
/// failed refresh only warns: the tool installs that follow are verified anyway.
pub(super) async fn refresh_package_lists<H: Host>(host: &H) -> Result<Option<PackageManager>> {
    let Some(manager) = detect(host) else {
        log::warn!("Neither apt-get nor yum found; skipping package list refresh");
        return Ok(None);
    };

    if let Some(cmd) = manager.refresh_command(host.is_root()) {
        ui::step(&format!("📦 Updating package lists via {manager}..."));
        let status = host.run(&cmd).await?;
        if !status.success {
            ui::warn(&format!("{manager} could not refresh package lists, continuing"));
        }
    }

    Ok(Some(manager))
}
