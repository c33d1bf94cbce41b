//! Server pair control: start, stop, status
//!
//! The backend runs in the background on the fixed port; the frontend runs in
//! the foreground until it exits or the user presses Ctrl+C, after which the
//! backend is stopped too.

use log::info;

use crate::context::LaunchContext;
use crate::error::{LauncherError, Result};
use crate::host::{CommandSpec, Host};
use crate::port;
use crate::prompt::Prompter;
use crate::ui;

/// Snapshot of the installation and the fixed port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub installed: bool,
    pub port: u16,
    pub pids: Vec<u32>,
}

impl ServerStatus {
    pub fn is_running(&self) -> bool {
        !self.pids.is_empty()
    }
}

fn server_command(argv: &[String], name: &str) -> Result<CommandSpec> {
    CommandSpec::from_argv(argv)
        .ok_or_else(|| LauncherError::Config(format!("{name} command is empty")))
}

/// The readiness check cannot tell our backend from a stale one, so the port
/// has to be free before the backend is spawned.
async fn ensure_port_free<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    let port = ctx.config.port;
    let pids = port::listening_pids(&ctx.host, port).await?;
    if pids.is_empty() && !port::is_listening(port).await {
        return Ok(());
    }
    Err(LauncherError::PortInUse { port, pids })
}

pub async fn start_server<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    let config = &ctx.config;
    let dir = &config.install_dir;
    if !dir.is_dir() {
        return Err(LauncherError::NotInstalled { path: dir.clone() });
    }

    let backend = server_command(&config.backend_command, "backend")?.current_dir(dir);
    let frontend = server_command(&config.frontend_command, "frontend")?.current_dir(dir);
    ensure_port_free(ctx).await?;

    ui::step("🚀 Starting CodeLive backend...");
    let mut backend_process = ctx.host.spawn_background(&backend).await?;
    if let Err(e) =
        port::wait_until_listening(config.port, config.ready_timeout(), &mut backend_process).await
    {
        backend_process.stop().await;
        return Err(e);
    }
    ui::success(&format!("Backend listening on http://localhost:{}", config.port));

    ui::step("🖥  Starting CodeLive frontend (Ctrl+C to stop)...");
    let outcome = tokio::select! {
        status = ctx.host.run(&frontend) => Some(status),
        _ = tokio::signal::ctrl_c() => None,
    };
    backend_process.stop().await;

    match outcome {
        Some(status) => status?.check("frontend server"),
        None => {
            info!("Interrupted, servers stopped");
            ui::plain("\nCodeLive stopped.");
            Ok(())
        }
    }
}

/// Terminate everything listening on the CodeLive port.
pub async fn stop_server<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    let port = ctx.config.port;
    let pids = port::listening_pids(&ctx.host, port).await?;
    if pids.is_empty() {
        ui::plain(&format!("No CodeLive server is running on port {port}"));
        return Ok(());
    }

    for pid in &pids {
        ctx.host.terminate(*pid)?;
        info!("Terminated pid {pid} on port {port}");
    }
    ui::success(&format!("Stopped CodeLive server on port {port}"));
    Ok(())
}

pub async fn server_status<H: Host, P: Prompter>(
    ctx: &LaunchContext<H, P>,
) -> Result<ServerStatus> {
    let port = ctx.config.port;
    let status = ServerStatus {
        installed: ctx.config.install_dir.is_dir(),
        port,
        pids: port::listening_pids(&ctx.host, port).await?,
    };

    if status.installed {
        ui::success(&format!("Installed at {}", ctx.config.install_dir.display()));
    } else {
        ui::warn(&format!("Not installed ({} missing)", ctx.config.install_dir.display()));
    }
    if status.is_running() {
        ui::success(&format!("Running on port {port} (pid {:?})", status.pids));
    } else {
        ui::plain(&format!("Not running on port {port}"));
    }
    Ok(status)
}
