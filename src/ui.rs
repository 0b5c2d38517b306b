//! Console output for skiff.
//!
//! Skiff has no logging framework; this module is the sink. Info and success
//! lines go to stdout, warnings and errors to stderr. Colors and unicode
//! icons degrade automatically when the stream is not a terminal or NO_COLOR
//! is set.

use crossterm::style::{Color, Stylize};
use is_terminal::IsTerminal;

/// Semantic colors.
mod colors {
    use super::Color;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const INFO: Color = Color::Cyan;
}

mod icons {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const INFO: &str = "●";
}

mod icons_ascii {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[FAIL]";
    pub const WARNING: &str = "[WARN]";
    pub const INFO: &str = "[..]";
}

fn color_enabled(stream_is_terminal: bool) -> bool {
    stream_is_terminal && std::env::var_os("NO_COLOR").is_none()
}

fn unicode_enabled() -> bool {
    // Windows consoles without UTF-8 codepages render the icons as mojibake.
    if cfg!(windows) {
        std::env::var("WT_SESSION").is_ok()
    } else {
        true
    }
}

fn paint(icon: &str, icon_ascii: &str, color: Color, colored: bool) -> String {
    let icon = if unicode_enabled() { icon } else { icon_ascii };
    if colored {
        icon.with(color).to_string()
    } else {
        icon.to_string()
    }
}

/// Print the tool banner shown before interactive flows.
pub fn banner() {
    let line = format!("skiff ({})", env!("CARGO_PKG_VERSION"));
    if color_enabled(std::io::stdout().is_terminal()) {
        println!("{}", line.with(colors::INFO));
    } else {
        println!("{line}");
    }
}

pub fn info(message: &str) {
    let colored = color_enabled(std::io::stdout().is_terminal());
    println!(
        "{} {message}",
        paint(icons::INFO, icons_ascii::INFO, colors::INFO, colored)
    );
}

pub fn success(message: &str) {
    let colored = color_enabled(std::io::stdout().is_terminal());
    println!(
        "{} {message}",
        paint(icons::SUCCESS, icons_ascii::SUCCESS, colors::SUCCESS, colored)
    );
}

pub fn warn(message: &str) {
    let colored = color_enabled(std::io::stderr().is_terminal());
    eprintln!(
        "{} {message}",
        paint(icons::WARNING, icons_ascii::WARNING, colors::WARNING, colored)
    );
}

pub fn error(message: &str) {
    let colored = color_enabled(std::io::stderr().is_terminal());
    eprintln!(
        "{} {message}",
        paint(icons::ERROR, icons_ascii::ERROR, colors::ERROR, colored)
    );
}

/// Mask a secret length-for-length for display.
///
/// Counted by characters, not bytes, so multibyte passwords do not leak
/// their byte length.
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secret_is_length_for_length() {
        assert_eq!(mask_secret("hunter2"), "*******");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn mask_secret_counts_characters_not_bytes() {
        assert_eq!(mask_secret("päss"), "****");
    }
}
