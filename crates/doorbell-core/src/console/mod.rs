//! Serial operator console
//!
//! A blocking, line-oriented text menu. The console owns no state of its own:
//! the menu actions live on [`crate::device::Doorbell`] (see `menu.rs`) and
//! this module provides the serial abstraction, the deadline-bounded line
//! reader and the small parsing helpers they share.

/// `writeln!` to the console, ignoring write errors.
///
/// Nothing useful can be done when the serial port itself fails.
macro_rules! say {
    ($serial:expr) => {{
        use core::fmt::Write as _;
        let _ = writeln!($serial);
    }};
    ($serial:expr, $($arg:tt)*) => {{
        use core::fmt::Write as _;
        let _ = writeln!($serial, $($arg)*);
    }};
}
pub(crate) use say;

mod line_reader;
mod menu;

pub use line_reader::read_line;
pub use menu::MenuChoice;

use alloc::string::String;

/// Byte-oriented serial port.
///
/// Output goes through [`core::fmt::Write`]; input is polled one byte at a
/// time without blocking.
pub trait SerialPort: core::fmt::Write {
    /// Whether at least one received byte is waiting.
    fn read_ready(&mut self) -> bool;

    /// Take the next received byte, `None` if nothing is waiting.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Parse a leading integer the way the menu has always accepted input.
///
/// Leading whitespace and an optional sign are allowed, parsing stops at the
/// first non-digit and anything without digits reads as 0.
pub fn parse_int(input: &str) -> i64 {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if negative { -value } else { value }
}

/// Mask a password for display, one `*` per character.
pub fn mask_password(password: &str) -> String {
    if password.is_empty() {
        String::from("(not set)")
    } else {
        password.chars().map(|_| '*').collect()
    }
}

/// Show empty settings as `(not set)`.
pub fn or_not_set(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_accepts_leading_number() {
        assert_eq!(parse_int("3"), 3);
        assert_eq!(parse_int("  12abc"), 12);
        assert_eq!(parse_int("-2"), -2);
        assert_eq!(parse_int("+7"), 7);
    }

    #[test]
    fn test_parse_int_non_numeric_is_zero() {
        assert_eq!(parse_int("wifi"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(mask_password("secret123"), "*********");
        assert_eq!(mask_password(""), "(not set)");
    }
}
