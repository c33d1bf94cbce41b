//! Fixed-port inspection: who is listening, and waiting for a listener

use std::time::Duration;

use log::{debug, warn};
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep};

use crate::error::{LauncherError, Result};
use crate::host::{BackgroundProcess, CommandSpec, Host};
use crate::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pids from `lsof -t` output, one per line. Junk lines are skipped.
pub fn parse_pids(output: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

pub fn lsof_command(port: u16) -> CommandSpec {
    CommandSpec::new("lsof").args([
        "-t".to_string(),
        format!("-i:{port}"),
        "-sTCP:LISTEN".to_string(),
    ])
}

/// Processes listening on `port`.
///
/// lsof exits 1 when nothing matches, so its status is not checked. Without
/// lsof on PATH the port is reported free.
pub async fn listening_pids<H: Host>(host: &H, port: u16) -> Result<Vec<u32>> {
    if !host.has_program("lsof") {
        warn!("lsof not found; cannot inspect port {port}");
        return Ok(Vec::new());
    }
    let output = host.capture(&lsof_command(port)).await?;
    let pids = parse_pids(&output.stdout);
    debug!("Port {port} listeners: {pids:?}");
    Ok(pids)
}

/// Whether something accepts TCP connections on `127.0.0.1:port`.
pub async fn is_listening(port: u16) -> bool {
    TcpStream::connect(("127.0.0.1", port)).await.is_ok()
}

/// Poll `port` until it accepts connections while `process` is still alive.
///
/// Callers make sure the port was free before spawning `process`. An open
/// port only counts once `process` is confirmed running after the connect,
/// so a backend that dies (for example on `EADDRINUSE`) is reported as a
/// failed step. Times out with [`LauncherError::ServerNotReady`].
pub async fn wait_until_listening(
    port: u16,
    timeout: Duration,
    process: &mut BackgroundProcess,
) -> Result<()> {
    let spinner = ui::spinner(format!("Waiting for {} on port {port}...", process.label()));
    let deadline = Instant::now() + timeout;

    let result = loop {
        if let Some(status) = process.try_exited() {
            break Err(LauncherError::step(process.label(), status.code));
        }
        if is_listening(port).await && process.try_exited().is_none() {
            break Ok(());
        }
        if Instant::now() >= deadline {
            break Err(LauncherError::ServerNotReady {
                port,
                secs: timeout.as_secs(),
            });
        }
        sleep(POLL_INTERVAL).await;
    };

    spinner.finish_and_clear();
    result
}
