//! Console output — owo-colors stylesheet and the installer's bordered
//! section headers.

use owo_colors::{OwoColorize, Style};
use std::io::IsTerminal;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }
}

/// Stylesheet for this process — colored only when stdout is a terminal.
pub fn styles() -> Styles {
    let mut styles = Styles::default();
    if std::io::stdout().is_terminal() {
        styles.colorize();
    }
    styles
}

/// Bordered section header.
pub fn header(styles: &Styles, message: &str) {
    let border = "=".repeat(message.chars().count() + 4);
    println!();
    println!("{}", border.style(styles.header));
    println!("{}", format!("  {}", message).style(styles.header));
    println!("{}", border.style(styles.header));
    println!();
}

pub fn ok(styles: &Styles, message: &str) {
    println!("{} {}", "✓".style(styles.success), message);
}

pub fn warn(styles: &Styles, message: &str) {
    println!("{} {}", "!".style(styles.warning), message.style(styles.warning));
}

pub fn fail(styles: &Styles, message: &str) {
    eprintln!("{} {}", "✗".style(styles.error), message.style(styles.error));
}

pub fn note(styles: &Styles, message: &str) {
    println!("{}", message.style(styles.dim));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles_are_plain() {
        // A default stylesheet must not panic on any painter
        let styles = Styles::default();
        header(&styles, "Section");
        ok(&styles, "done");
        warn(&styles, "careful");
        fail(&styles, "broken");
        note(&styles, "aside");
    }

    #[test]
    fn test_colorized_stylesheet() {
        let mut styles = Styles::default();
        styles.colorize();
        ok(&styles, "done in color");
    }
}
