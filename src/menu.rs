//! Interactive menu

use crate::context::LaunchContext;
use crate::control;
use crate::error::Result;
use crate::host::Host;
use crate::install;
use crate::prompt::Prompter;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    StartServer,
    Install,
    ApiKey,
    Exit,
}

impl MenuChoice {
    pub const ALL: [Self; 4] = [Self::StartServer, Self::Install, Self::ApiKey, Self::Exit];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::StartServer),
            "2" => Some(Self::Install),
            "3" => Some(Self::ApiKey),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StartServer => "Start CodeLive server",
            Self::Install => "Install CodeLive",
            Self::ApiKey => "Get API Key",
            Self::Exit => "Exit",
        }
    }
}

pub fn show_api_key_placeholder() {
    ui::plain("🔑 Get API Key: coming soon.");
}

fn print_menu() {
    ui::plain("");
    for (index, choice) in MenuChoice::ALL.iter().enumerate() {
        ui::plain(&format!("  {}) {}", index + 1, choice.label()));
    }
    ui::plain("");
}

/// Read-eval loop over the menu.
///
/// Invalid input re-prompts. Returns `Ok` on Exit; a failing action ends the
/// loop with its error.
pub async fn run_menu<H: Host, P: Prompter>(ctx: &LaunchContext<H, P>) -> Result<()> {
    ui::banner();

    loop {
        print_menu();
        let input = ctx.prompter.read_line("Enter your choice [1-4]:")?;

        match MenuChoice::parse(&input) {
            Some(MenuChoice::StartServer) => control::start_server(ctx).await?,
            Some(MenuChoice::Install) => install::run_install(ctx).await?,
            Some(MenuChoice::ApiKey) => show_api_key_placeholder(),
            Some(MenuChoice::Exit) => {
                ui::plain("Goodbye!");
                return Ok(());
            }
            None => ui::warn(&format!(
                "Invalid choice '{}', enter a number from 1 to 4",
                input.trim()
            )),
        }
    }
}
