use alloc::string::String;
use alloc::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use log::{debug, trace};

use super::SerialPort;
use crate::config::{MAX_LINE_LEN, SERIAL_POLL_MS};
use crate::time::{Clock, Deadline};

/// Wait up to `timeout_ms` for a CR- or LF-terminated line.
///
/// Blank lines (including the LF of a CRLF pair) are skipped, so a bare Enter
/// keeps waiting. Returns the trimmed line, or an empty string when the
/// deadline passes first; a partially typed line is discarded in that case.
/// Bytes past [`MAX_LINE_LEN`] are dropped.
pub async fn read_line<S, T>(serial: &mut S, timer: &mut T, timeout_ms: u64) -> String
where
    S: SerialPort,
    T: Clock + DelayNs,
{
    let deadline = Deadline::after(timer, timeout_ms);
    let mut line: Vec<u8> = Vec::new();

    loop {
        while let Some(byte) = serial.read_byte() {
            match byte {
                b'\r' | b'\n' => {
                    let text = String::from_utf8_lossy(&line);
                    let text = text.trim();
                    if !text.is_empty() {
                        trace!("Console line: {:?}", text);
                        return String::from(text);
                    }
                    line.clear();
                }
                _ if line.len() < MAX_LINE_LEN => line.push(byte),
                _ => {}
            }
        }

        if deadline.has_passed(timer) {
            debug!("Console read timed out after {} ms", timeout_ms);
            return String::new();
        }

        timer.delay_ms(SERIAL_POLL_MS).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTimer, MockSerial};
    use embassy_futures::block_on;

    #[test]
    fn test_reads_lf_terminated_line() {
        let mut serial = MockSerial::new();
        serial.push_input("3\n");

        let line = block_on(read_line(&mut serial, &mut FakeTimer::new(), 30_000));

        assert_eq!(line, "3");
    }

    #[test]
    fn test_skips_blank_lines_and_crlf() {
        let mut serial = MockSerial::new();
        serial.push_input("\r\n\r\n  \nhttp://x\r\n");

        let line = block_on(read_line(&mut serial, &mut FakeTimer::new(), 30_000));

        assert_eq!(line, "http://x");
        assert_eq!(serial.pending(), 1, "trailing LF stays for the next read");
    }

    #[test]
    fn test_times_out_with_empty_string() {
        let mut serial = MockSerial::new();
        let mut timer = FakeTimer::new();

        let line = block_on(read_line(&mut serial, &mut timer, 30_000));

        assert_eq!(line, "");
        assert_eq!(timer.now(), 30_000);
    }

    #[test]
    fn test_unterminated_input_is_discarded_on_timeout() {
        let mut serial = MockSerial::new();
        serial.push_input("HomeN");

        let line = block_on(read_line(&mut serial, &mut FakeTimer::new(), 1_000));

        assert_eq!(line, "");
    }

    #[test]
    fn test_line_arriving_late_is_still_read() {
        let mut timer = FakeTimer::new();
        let mut serial = MockSerial::with_clock(&timer);
        serial.push_input_at(5_000, "2\n");

        let line = block_on(read_line(&mut serial, &mut timer, 30_000));

        assert_eq!(line, "2");
        assert!(timer.now() >= 5_000 && timer.now() < 30_000);
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let mut serial = MockSerial::new();
        let long: String = core::iter::repeat('a').take(MAX_LINE_LEN + 40).collect();
        serial.push_input(&long);
        serial.push_input("\n");

        let line = block_on(read_line(&mut serial, &mut FakeTimer::new(), 1_000));

        assert_eq!(line.len(), MAX_LINE_LEN);
    }
}
