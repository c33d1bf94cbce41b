//! Real background processes driven through `SystemHost`

#![cfg(unix)]

mod common;

use std::fs;
use std::time::Duration;

use codelive_launcher::host::CommandSpec;
use codelive_launcher::{Host, LaunchContext, LauncherError, SystemHost, control};
use common::{ScriptedPrompter, exits_soon, free_port, read_pid_file, scratch_config, sh};

/// Backend that forks a long sleep, records its pid and waits on it, like
/// pnpm running the node server as a grandchild.
const FORKING_BACKEND: &str = "sleep 300 & echo $! > grandchild.pid; wait";

fn system_ctx(
    root: &std::path::Path,
    backend: &str,
    frontend: &str,
) -> LaunchContext<SystemHost, ScriptedPrompter> {
    let mut config = scratch_config(root);
    config.port = free_port();
    config.backend_command = sh(backend);
    config.frontend_command = sh(frontend);
    fs::create_dir_all(&config.install_dir).unwrap();
    LaunchContext::new(config, SystemHost, ScriptedPrompter::default())
}

#[tokio::test]
async fn stop_takes_down_grandchildren() {
    let scratch = tempfile::tempdir().unwrap();
    let backend = CommandSpec::new("sh")
        .args(["-c", FORKING_BACKEND])
        .current_dir(scratch.path());

    let process = SystemHost.spawn_background(&backend).await.unwrap();
    let grandchild = read_pid_file(&scratch.path().join("grandchild.pid")).await;
    assert!(common::is_alive(grandchild));

    process.stop().await;

    assert!(exits_soon(grandchild).await, "grandchild {grandchild} survived stop");
}

#[tokio::test]
async fn backend_on_occupied_port_is_refused() {
    let scratch = tempfile::tempdir().unwrap();
    let mut ctx = system_ctx(scratch.path(), "exit 3", "true");
    let stale = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    ctx.config.port = stale.local_addr().unwrap().port();

    let err = control::start_server(&ctx).await.unwrap_err();

    assert!(matches!(err, LauncherError::PortInUse { port, .. } if port == ctx.config.port));
}

#[tokio::test]
async fn backend_exiting_before_listening_is_a_failed_step() {
    let scratch = tempfile::tempdir().unwrap();
    let ctx = system_ctx(scratch.path(), "exit 3", "true");

    let err = control::start_server(&ctx).await.unwrap_err();

    assert!(matches!(err, LauncherError::StepFailed { code: Some(3), .. }));
}

#[tokio::test]
async fn readiness_timeout_stops_the_whole_backend() {
    let scratch = tempfile::tempdir().unwrap();
    let mut ctx = system_ctx(scratch.path(), FORKING_BACKEND, "true");
    ctx.config.ready_timeout_secs = 1;

    let err = control::start_server(&ctx).await.unwrap_err();
    assert!(matches!(err, LauncherError::ServerNotReady { .. }));

    let grandchild = read_pid_file(&ctx.config.install_dir.join("grandchild.pid")).await;
    assert!(exits_soon(grandchild).await, "grandchild {grandchild} survived timeout");
}

#[tokio::test]
async fn frontend_exit_stops_the_backend() {
    let scratch = tempfile::tempdir().unwrap();
    let ctx = system_ctx(scratch.path(), FORKING_BACKEND, "exit 0");

    // Stand in for the backend's listener once it is up.
    let port = ctx.config.port;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    control::start_server(&ctx).await.unwrap();

    let grandchild = read_pid_file(&ctx.config.install_dir.join("grandchild.pid")).await;
    assert!(exits_soon(grandchild).await, "grandchild {grandchild} outlived the frontend");
}
