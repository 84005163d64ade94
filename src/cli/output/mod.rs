//! Terminal output
//!
//! Live tool output reaches the terminal through a [`ConsoleSubscription`]
//! on the runner's bus; results are printed once an operation completes,
//! either human-readable or as JSON.

use crate::cli::config::{OutputDefaults, OutputFormat};
use crate::cli::error::Result;
use crate::core::{CliCheckResult, CommandResult};
use crate::runtime::{Channel, CommandRunner, SubscriptionId};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// How live chunks are written to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleStyle {
    /// Prefix each chunk with the local time it arrived
    pub timestamps: bool,
    /// Send tool stdout to our stderr, keeping our stdout for JSON results
    pub stdout_to_stderr: bool,
}

impl ConsoleStyle {
    pub fn from_settings(output: &OutputDefaults) -> Self {
        Self {
            timestamps: output.timestamps,
            stdout_to_stderr: output.format == OutputFormat::Json,
        }
    }

    fn format_chunk(&self, channel: Channel, chunk: &str) -> String {
        let text = if self.timestamps {
            let now = chrono::Local::now().format("%H:%M:%S");
            format!("{} {}", format!("[{}]", now).dimmed(), chunk)
        } else {
            chunk.to_string()
        };

        match channel {
            Channel::Stdout => text,
            Channel::Stderr => text.yellow().to_string(),
        }
    }
}

/// Prints bus output while alive; unsubscribes on drop
pub struct ConsoleSubscription {
    runner: Arc<CommandRunner>,
    stdout: SubscriptionId,
    stderr: SubscriptionId,
}

impl ConsoleSubscription {
    pub fn attach(runner: &Arc<CommandRunner>, style: ConsoleStyle) -> Self {
        let stdout = runner.bus().subscribe(Channel::Stdout, move |chunk| {
            let text = style.format_chunk(Channel::Stdout, chunk);
            if style.stdout_to_stderr {
                write_flushed(&mut std::io::stderr().lock(), &text);
            } else {
                write_flushed(&mut std::io::stdout().lock(), &text);
            }
        });
        let stderr = runner.bus().subscribe(Channel::Stderr, move |chunk| {
            let text = style.format_chunk(Channel::Stderr, chunk);
            write_flushed(&mut std::io::stderr().lock(), &text);
        });

        Self {
            runner: Arc::clone(runner),
            stdout,
            stderr,
        }
    }
}

impl Drop for ConsoleSubscription {
    fn drop(&mut self) {
        self.runner.bus().unsubscribe(Channel::Stdout, self.stdout);
        self.runner.bus().unsubscribe(Channel::Stderr, self.stderr);
    }
}

fn write_flushed(out: &mut impl Write, text: &str) {
    // A closed terminal is not worth failing the tool run over.
    let _ = out.write_all(text.as_bytes());
    let _ = out.flush();
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a completed operation
pub fn print_completed(format: OutputFormat, what: &str, result: &CommandResult) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Pretty => {
            println!("{} {}", "✓".green().bold(), what);
            Ok(())
        }
    }
}

/// Report a tool check, with where each tool was found on PATH
pub fn print_check(
    format: OutputFormat,
    check: &CliCheckResult,
    locations: &[(String, Option<PathBuf>)],
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(check);
    }

    for prerequisite in check.prerequisites.iter().flatten() {
        if prerequisite.success {
            println!("{} {}", "✓".green().bold(), prerequisite.name);
        } else {
            println!(
                "{} {} {}",
                "✗".red().bold(),
                prerequisite.name,
                format!("(install: {})", prerequisite.url).dimmed()
            );
        }
    }

    for (tool, location) in locations {
        match location {
            Some(path) => println!("  {} {}", format!("{}:", tool).cyan(), path.display()),
            None => println!("  {} {}", format!("{}:", tool).cyan(), "not on PATH".dimmed()),
        }
    }
    Ok(())
}

/// Print a list of names, one per line
pub fn print_list(format: OutputFormat, title: &str, items: &[String]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!("{}", format!("No {} found", title).dimmed());
        return Ok(());
    }

    println!("{}", title.bold());
    for item in items {
        println!("  {}", item);
    }
    Ok(())
}
