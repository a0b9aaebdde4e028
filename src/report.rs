//! Terminal presentation of interlace results.
//!
//! Front ends call a [`ResultReporter`] around the library calls; nothing in
//! `image_pipeline` prints or spawns processes itself.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::image_pipeline::InterlaceSummary;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";

pub trait ResultReporter {
    fn loaded(&self, path: &Path);
    fn success(&self, summary: &InterlaceSummary);
    fn failure(&self, message: &str);
}

/// Reports to stdout/stderr, optionally styled with ANSI colors and an OSC 8
/// hyperlink to the output file.
pub struct TerminalReporter {
    color: bool,
    reveal: bool,
}

impl TerminalReporter {
    pub fn new(color: bool, reveal: bool) -> Self {
        Self { color, reveal }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn banner(&self) -> String {
        let style = format!("{BOLD}{CYAN}");
        [
            "┌─────────────────────────┐",
            "│       INTERLACER        │",
            "└─────────────────────────┘",
        ]
        .iter()
        .map(|line| self.paint(&style, line))
        .collect::<Vec<_>>()
        .join("\n")
    }

    pub fn loaded_line(&self, path: &Path) -> String {
        format!(
            "{} Loaded {}",
            self.paint(GREEN, "✓"),
            self.paint(BOLD, &path.display().to_string())
        )
    }

    pub fn success_line(&self, summary: &InterlaceSummary, absolute: &Path) -> String {
        let name = summary.output.display().to_string();
        let target = if self.color {
            format!(
                "\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\",
                absolute.display(),
                self.paint(BOLD, &name)
            )
        } else {
            name
        };
        format!(
            "{} Wrote {} ({}x{} {}-bit {} channels)",
            self.paint(GREEN, "✓ Success!"),
            target,
            summary.width,
            summary.height,
            summary.bits_per_sample,
            summary.samples_per_pixel
        )
    }

    pub fn failure_line(&self, message: &str) -> String {
        format!("{} {}", self.paint(RED, "✗ Error:"), message)
    }
}

impl ResultReporter for TerminalReporter {
    fn loaded(&self, path: &Path) {
        println!("{}", self.loaded_line(path));
    }

    fn success(&self, summary: &InterlaceSummary) {
        let absolute = absolute_path(&summary.output);
        println!("\n{}", self.success_line(summary, &absolute));

        if self.reveal {
            if let Err(e) = reveal_in_file_browser(&absolute) {
                warn!("Could not reveal {}: {}", absolute.display(), e);
            }
        }
    }

    fn failure(&self, message: &str) {
        eprintln!("\n{}", self.failure_line(message));
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Opens the platform file browser with `path` selected (or its folder shown).
pub fn reveal_in_file_browser(path: &Path) -> std::io::Result<()> {
    let mut command = reveal_command(path);
    debug!("Revealing output with {:?}", command);
    let status = command.status()?;
    if !status.success() {
        return Err(std::io::Error::other(format!("file browser exited with {status}")));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn reveal_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg("-R").arg(path);
    command
}

#[cfg(target_os = "windows")]
fn reveal_command(path: &Path) -> Command {
    let mut command = Command::new("explorer");
    command.arg(format!("/select,{}", path.display()));
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn reveal_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path.parent().unwrap_or_else(|| Path::new(".")));
    command
}
