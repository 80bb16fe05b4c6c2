//! ANSI escape codes used by the terminal renderers.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Wrap `text` in `code` when `enabled`, otherwise return it unchanged.
pub fn paint(text: &str, code: &str, enabled: bool) -> String {
    if enabled {
        format!("{code}{text}{RESET}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_toggle() {
        assert_eq!(paint("x", GREEN, true), "\x1b[32mx\x1b[0m");
        assert_eq!(paint("x", GREEN, false), "x");
    }
}
