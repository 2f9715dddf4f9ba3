use alloc::string::String;

use super::{HttpError, HttpResponse};

/// Parse a raw HTTP/1.x response read until the server closed the connection.
///
/// Only the status line is interpreted; headers are skipped and everything
/// after the blank line is the body.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, HttpError> {
    let (head, body) = match raw.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(end) => (&raw[..end], &raw[end + 4..]),
        None => (raw, &raw[raw.len()..]),
    };

    let head = core::str::from_utf8(head).map_err(|_| HttpError::NoHttpServer)?;
    let mut status_line = head.lines().next().unwrap_or_default().split_whitespace();

    if !status_line.next().is_some_and(|v| v.starts_with("HTTP/")) {
        return Err(HttpError::NoHttpServer);
    }

    let status = status_line
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..=999).contains(code))
        .ok_or(HttpError::NoHttpServer)?;

    Ok(HttpResponse {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_status_and_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nrang!";

        let response = parse_response(raw).unwrap();

        assert_eq!(response, HttpResponse::new(200, "rang!"));
    }

    #[test]
    fn test_error_status_is_still_a_response() {
        let response = parse_response(b"HTTP/1.0 404 Not Found\r\n\r\nno such hook").unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, "no such hook");
    }

    #[test]
    fn test_headers_only() {
        let response = parse_response(b"HTTP/1.1 204 No Content\r\nServer: x").unwrap();

        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_non_http_reply_is_rejected() {
        assert_eq!(parse_response(b""), Err(HttpError::NoHttpServer));
        assert_eq!(parse_response(b"SSH-2.0-OpenSSH\r\n"), Err(HttpError::NoHttpServer));
        assert_eq!(parse_response(b"HTTP/1.1 abc\r\n\r\n"), Err(HttpError::NoHttpServer));
    }
}
