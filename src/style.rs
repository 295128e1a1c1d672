//! ANSI styling for chat output.
//!
//! Every helper returns the text unchanged when styling is off, so captured
//! output in tests and piped stdout stay plain.

use crate::colors::UsernameColor;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Width of horizontal rules.
pub const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    styled: bool,
}

impl Style {
    #[must_use]
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self { styled: false }
    }

    #[must_use]
    pub fn is_styled(self) -> bool {
        self.styled
    }

    #[must_use]
    pub fn paint(self, codes: &str, text: &str) -> String {
        if self.styled {
            format!("{codes}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    #[must_use]
    pub fn dim(self, text: &str) -> String {
        self.paint(DIM, text)
    }

    #[must_use]
    pub fn bold(self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    #[must_use]
    pub fn red(self, text: &str) -> String {
        self.paint(RED, text)
    }

    #[must_use]
    pub fn green(self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    #[must_use]
    pub fn yellow(self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    #[must_use]
    pub fn cyan(self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    #[must_use]
    pub fn username(self, color: UsernameColor, text: &str) -> String {
        self.paint(color.ansi(), text)
    }

    /// Horizontal rule with a centered title, e.g. `──── Live Chat ────`.
    #[must_use]
    pub fn rule(self, title: &str) -> String {
        let title_width = title.chars().count() + 2;
        let remaining = RULE_WIDTH.saturating_sub(title_width);
        let left = remaining / 2;
        let right = remaining - left;
        let line = format!("{} {title} {}", "─".repeat(left), "─".repeat(right));
        self.cyan(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_style_leaves_text_untouched() {
        let style = Style::plain();
        assert_eq!(style.dim("x"), "x");
        assert_eq!(style.username(UsernameColor::Red, "bob"), "bob");
    }

    #[test]
    fn styled_text_is_wrapped_and_reset() {
        let style = Style::new(true);
        assert_eq!(style.dim("x"), "\x1b[2mx\x1b[0m");
        assert_eq!(
            style.username(UsernameColor::Cyan, "alice"),
            "\x1b[36malice\x1b[0m"
        );
    }

    #[test]
    fn rule_centers_title_within_width() {
        let rule = Style::plain().rule("Live Chat");
        assert_eq!(rule.chars().count(), RULE_WIDTH);
        assert!(rule.contains(" Live Chat "));
        assert!(rule.starts_with('─'));
        assert!(rule.ends_with('─'));
    }
}
