mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use codelive_launcher::{
    LaunchContext, LauncherConfig, SystemHost, TerminalPrompter, control, install, menu, ui,
};

fn main() {
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            ui::error(&format!("Failed to create Tokio runtime: {e}"));
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(real_main()) {
        debug!("{e:?}");
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn real_main() -> Result<()> {
    let args = cli::Args::parse();

    let config = LauncherConfig::load(args.config.as_deref()).context("Failed to load config")?;
    info!("Install directory: {}", config.install_dir.display());

    let prompter = TerminalPrompter {
        assume_yes: args.yes,
    };
    let ctx = LaunchContext::new(config, SystemHost, prompter);

    match args.command() {
        cli::Cmd::Menu => menu::run_menu(&ctx).await?,
        cli::Cmd::Install => install::run_install(&ctx).await?,
        cli::Cmd::Start => control::start_server(&ctx).await?,
        cli::Cmd::Stop => control::stop_server(&ctx).await?,
        cli::Cmd::Status => {
            control::server_status(&ctx).await?;
        }
        cli::Cmd::ApiKey => menu::show_api_key_placeholder(),
    }
    Ok(())
}
