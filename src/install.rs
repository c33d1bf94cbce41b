//! The install sequence
//!
//! prerequisites → running-server check → clean → connectivity → clone →
//! pnpm → `pnpm install` → filtered build. The first failure aborts; nothing
//! already done is rolled back.

use std::io::ErrorKind;
use std::path::Path;

use log::info;

use crate::config::LauncherConfig;
use crate::context::LaunchContext;
use crate::error::{LauncherError, Result};
use crate::host::{CommandSpec, Host};
use crate::port;
use crate::prerequisites;
use crate::prompt::Prompter;
use crate::ui;

/// Offer to stop whatever already listens on the CodeLive port.
///
/// Anything other than an explicit yes aborts with [`LauncherError::Declined`].
pub async fn check_server_running<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    let port = ctx.config.port;
    let pids = port::listening_pids(&ctx.host, port).await?;
    if pids.is_empty() {
        return Ok(());
    }

    let pid_list = pids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    ui::warn(&format!(
        "A CodeLive server is already running on port {port} (pid {pid_list})"
    ));

    if !ctx.prompter.confirm("Stop it and continue?")? {
        return Err(LauncherError::Declined);
    }

    for pid in pids {
        ctx.host.terminate(pid)?;
        info!("Terminated pid {pid} on port {port}");
    }
    ui::success("Existing server stopped");
    Ok(())
}

/// Remove a previous installation: the pre-clean subdirectory first, then the
/// whole tree. A missing directory is fine.
pub async fn clean_install_dir(config: &LauncherConfig) -> Result<()> {
    let dir = &config.install_dir;
    if !tokio::fs::try_exists(dir)
        .await
        .map_err(|e| LauncherError::fs(dir, e))?
    {
        return Ok(());
    }

    ui::step(&format!("🧹 Removing existing installation at {}...", dir.display()));
    remove_tree(&dir.join(&config.preclean_subdir)).await?;
    remove_tree(dir).await?;
    ui::success("Previous installation removed");
    Ok(())
}

async fn remove_tree(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LauncherError::fs(path, e)),
    }
}

pub async fn check_connectivity<H: Host>(config: &LauncherConfig, host: &H) -> Result<()> {
    let spinner = ui::spinner("Checking internet connection...");
    let online = host
        .is_reachable(&config.connectivity_url, config.connectivity_timeout())
        .await;
    spinner.finish_and_clear();

    if !online {
        return Err(LauncherError::Offline {
            url: config.connectivity_url.clone(),
        });
    }
    ui::success("Internet connection available");
    Ok(())
}

pub fn clone_command(config: &LauncherConfig) -> CommandSpec {
    CommandSpec::new("git").args([
        "clone".to_string(),
        config.repo_url.clone(),
        config.install_dir.display().to_string(),
    ])
}

pub fn dependency_install_command(config: &LauncherConfig) -> CommandSpec {
    CommandSpec::new("pnpm")
        .arg("install")
        .current_dir(&config.install_dir)
}

/// `pnpm --filter <a> --filter <b> ... build`
pub fn build_command(config: &LauncherConfig) -> CommandSpec {
    let filters = config
        .build_filters
        .iter()
        .flat_map(|filter| ["--filter".to_string(), filter.clone()]);
    CommandSpec::new("pnpm")
        .args(filters)
        .arg("build")
        .current_dir(&config.install_dir)
}

/// Fetch and build CodeLive into the install directory.
pub async fn install<H: Host>(config: &LauncherConfig, host: &H) -> Result<()> {
    check_connectivity(config, host).await?;

    ui::step(&format!("📥 Cloning {}...", config.repo_url));
    host.run(&clone_command(config)).await?.check("git clone")?;
    ui::success(&format!("Cloned into {}", config.install_dir.display()));

    prerequisites::ensure_pnpm(host).await?;

    ui::step("📦 Installing dependencies...");
    host.run(&dependency_install_command(config))
        .await?
        .check("pnpm install")?;
    ui::success("Dependencies installed");

    ui::step("🔨 Building packages...");
    host.run(&build_command(config)).await?.check("pnpm build")?;
    ui::success("Packages built");
    Ok(())
}

/// The full "check then install" sequence used by `--install` and the menu.
pub async fn run_install<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    prerequisites::ensure_prerequisites(ctx.os, &ctx.host).await?;
    check_server_running(ctx).await?;
    clean_install_dir(&ctx.config).await?;
    install(&ctx.config, &ctx.host).await?;

    ui::success(&format!(
        "CodeLive installed at {}",
        ctx.config.install_dir.display()
    ));
    ui::plain("Start it from the menu or with `codelive start`.");
    Ok(())
}
