//! Terminal output for the marble CLI.
//!
//! Status lines go to stderr with a right-aligned verb column, so stdout
//! stays clean for export strings and `list --json`.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::progress::ProgressSummary;
use crate::types::Rgb;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const VERB_WIDTH: usize = 12;

/// Status printer; ANSI styling only when stderr is a terminal.
pub struct Printer {
    colour: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            colour: io::stderr().is_terminal(),
        }
    }

    /// A printer that never emits escape codes.
    pub fn plain() -> Self {
        Self { colour: false }
    }

    /// Green verb, for completed actions: `"     Created Flag [0 !]"`.
    pub fn status(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    /// Cyan verb, for listings and details.
    pub fn info(&self, verb: &str, message: &str) {
        self.print_line(CYAN, verb, message);
    }

    /// Yellow verb, for skipped tiles and recoverable problems.
    pub fn warning(&self, verb: &str, message: &str) {
        self.print_line(YELLOW, verb, message);
    }

    /// One `Progress` line per line of the summary text.
    pub fn progress(&self, summary: &ProgressSummary) {
        for line in summary.to_string().lines() {
            self.info("Progress", line);
        }
    }

    /// `"Flag [0 !]"` with the storage key dimmed.
    pub fn template(&self, name: &str, key: impl std::fmt::Display) -> String {
        format!("{} {}", name, self.dim(&format!("[{}]", key)))
    }

    /// A coloured block followed by the hex code, or just the hex code.
    pub fn swatch(&self, rgb: Rgb) -> String {
        if self.colour {
            format!("\x1b[48;2;{};{};{}m  {RESET} {}", rgb.r, rgb.g, rgb.b, rgb.to_hex())
        } else {
            rgb.to_hex()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        self.style(DIM, text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.style(BOLD, text)
    }

    /// Paths and other highlighted values.
    pub fn cyan(&self, text: &str) -> String {
        self.style(CYAN, text)
    }

    fn style(&self, code: &str, text: &str) -> String {
        if self.colour {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_line(&self, code: &str, verb: &str, message: &str) {
        let mut stderr = io::stderr().lock();
        let _ = if self.colour {
            writeln!(stderr, "{BOLD}{code}{verb:>VERB_WIDTH$}{RESET} {message}")
        } else {
            writeln!(stderr, "{verb:>VERB_WIDTH$} {message}")
        };
    }
}

/// `plural(1, "tile", "tiles")` → "1 tile".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { pluralized })
}

/// Path relative to the working directory when it lies below it.
pub fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    match relative {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.display().to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "template", "templates"), "1 template");
        assert_eq!(plural(0, "tile", "tiles"), "0 tiles");
        assert_eq!(plural(5, "colour", "colours"), "5 colours");
    }

    #[test]
    fn test_plain_labels() {
        let printer = Printer::plain();
        assert_eq!(printer.template("Flag", "0 !"), "Flag [0 !]");
        assert_eq!(printer.swatch(Rgb::new(255, 0, 0)), "#FF0000");
        assert_eq!(printer.bold("x"), "x");
    }

    #[test]
    fn test_coloured_swatch() {
        let printer = Printer { colour: true };
        let swatch = printer.swatch(Rgb::new(0, 0, 255));
        assert!(swatch.starts_with("\x1b[48;2;0;0;255m"));
        assert!(swatch.ends_with("#0000FF"));
    }

    #[test]
    fn test_display_path_outside_cwd() {
        let p = Path::new("/nonexistent/path/to/tile.png");
        assert_eq!(display_path(p), "/nonexistent/path/to/tile.png");
    }
}
