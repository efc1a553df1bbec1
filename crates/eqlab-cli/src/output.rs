use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print a command result: compact JSON in `--json` mode, pretty otherwise.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = if is_json() {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}

/// A colored one-line heading on stdout. Skipped in `--json` mode so JSON
/// consumers see structured output only.
pub fn heading(text: &str) -> anyhow::Result<()> {
    if is_json() {
        return Ok(());
    }
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(&mut stdout, "{text}")?;
    stdout.reset()?;
    Ok(())
}
