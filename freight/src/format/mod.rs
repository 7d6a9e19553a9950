//! Rendering of command results.

use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Pretty,
    Json,
    #[value(alias = "yml")]
    Yaml,
}

/// Results that have a human-readable rendering next to their serialized one.
pub trait Formattable: Serialize {
    fn format_pretty(&self) -> String;
}

/// Renders `item` in the requested format.
pub fn render<T: Formattable>(item: &T, format: OutputFormat) -> Result<String, String> {
    let serialized = match format {
        OutputFormat::Pretty => return Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(item).map_err(|e| e.to_string()),
    };
    serialized.map_err(|e| format!("cannot render {format:?} output: {e}"))
}

/// Renders `item` to stdout, or reports the failure and exits.
pub fn print<T: Formattable>(item: &T, format: OutputFormat) {
    match render(item, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            error(&e);
            std::process::exit(1);
        }
    }
}

/// Reports `message` on stderr.
pub fn error(message: &str) {
    let mark = if colors_on(std::io::stderr().is_terminal()) {
        "✗".red().bold().to_string()
    } else {
        "✗".to_string()
    };
    eprintln!("{mark} {message}");
}

/// `err` followed by each of its causes, separated by ": ".
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

pub fn checkmark() -> String {
    if colors_on(std::io::stdout().is_terminal()) {
        "✓".green().to_string()
    } else {
        "✓".to_string()
    }
}

/// Field name in a pretty listing.
pub fn label(text: &str) -> String {
    if colors_on(std::io::stdout().is_terminal()) {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

// NO_COLOR disables colors whatever its value.
fn colors_on(terminal: bool) -> bool {
    terminal && std::env::var_os("NO_COLOR").is_none()
}
