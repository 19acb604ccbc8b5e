// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: pastel cyan / steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Column captions and footers: medium grey
    pub const CONTEXT: u8 = 245;
    /// Rows with work waiting: amber
    pub const ACTIVE: u8 = 179;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Colors for rendered tables, decided once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Palette following [`should_colorize`].
    pub fn detect() -> Self {
        Self::new(should_colorize())
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, code: u8, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", fg256(code), text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Format text with the header color (steel blue).
    pub fn header(&self, text: &str) -> String {
        self.paint(codes::HEADER, text)
    }

    /// Format text with the context color (medium grey).
    pub fn context(&self, text: &str) -> String {
        self.paint(codes::CONTEXT, text)
    }

    /// Format text with the active-row color (amber).
    pub fn active(&self, text: &str) -> String {
        self.paint(codes::ACTIVE, text)
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
