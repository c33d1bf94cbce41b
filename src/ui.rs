//! Colored terminal output and spinners

use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn colored_line(stream: &mut StandardStream, color: Color, bold: bool, text: &str) {
    let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = writeln!(stream, "{text}");
    let _ = stream.reset();
}

fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

/// A step about to run.
pub fn step(text: &str) {
    colored_line(&mut stdout(), Color::Cyan, false, text);
}

pub fn success(text: &str) {
    colored_line(&mut stdout(), Color::Green, false, &format!("✓ {text}"));
}

pub fn warn(text: &str) {
    colored_line(&mut stdout(), Color::Yellow, false, &format!("⚠ {text}"));
}

/// Fatal error line on stderr.
pub fn error(text: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    colored_line(&mut stderr, Color::Red, true, &format!("❌ {text}"));
}

pub fn plain(text: &str) {
    let _ = writeln!(stdout(), "{text}");
}

pub fn banner() {
    let mut out = stdout();
    colored_line(&mut out, Color::Cyan, false, &format!("\n{RULE}"));
    colored_line(&mut out, Color::Cyan, true, "\n                    C O D E L I V E");
    let _ = writeln!(
        out,
        "\n              Installer & launcher  v{}",
        env!("CARGO_PKG_VERSION")
    );
    colored_line(&mut out, Color::Cyan, false, &format!("\n{RULE}\n"));
}

/// Steady-ticking spinner; call `finish_and_clear` when done.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
