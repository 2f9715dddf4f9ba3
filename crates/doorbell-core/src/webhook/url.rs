use core::fmt;

use thiserror_no_std::Error;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Whether the operator's input is acceptable as a trigger URL.
///
/// Only the scheme prefix is checked. The URL is stored as typed and any
/// other problem surfaces when the request is made.
pub fn is_trigger_url(input: &str) -> bool {
    input.starts_with(HTTP_PREFIX) || input.starts_with(HTTPS_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL must start with http:// or https://")]
    UnsupportedScheme,
    #[error("URL has no host")]
    MissingHost,
    #[error("URL port is not a number between 0 and 65535")]
    InvalidPort,
}

/// A trigger URL split into the parts needed to open a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookUrl<'a> {
    pub scheme: Scheme,
    pub host: &'a str,
    pub port: u16,
    path: &'a str,
}

impl<'a> WebhookUrl<'a> {
    /// Split `http[s]://[user@]host[:port][/path][?query][#fragment]`.
    ///
    /// User info and the fragment are dropped; neither goes on the wire.
    pub fn parse(input: &'a str) -> Result<Self, UrlError> {
        let (scheme, rest) = if let Some(rest) = input.strip_prefix(HTTPS_PREFIX) {
            (Scheme::Https, rest)
        } else if let Some(rest) = input.strip_prefix(HTTP_PREFIX) {
            (Scheme::Http, rest)
        } else {
            return Err(UrlError::UnsupportedScheme);
        };

        let split = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, path) = rest.split_at(split);
        let path = path.split('#').next().unwrap_or_default();

        let authority = authority.rsplit('@').next().unwrap_or(authority);
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| UrlError::InvalidPort)?),
            None => (authority, scheme.default_port()),
        };

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    /// Path and query as sent in the request line; never empty.
    pub fn request_target(&self) -> RequestTarget<'a> {
        RequestTarget(self.path)
    }

    /// Write a complete HTTP/1.0 GET request head.
    ///
    /// HTTP/1.0 keeps servers from answering with a chunked body, so the
    /// response can be read until the peer closes.
    pub fn write_get_request<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "GET {} HTTP/1.0\r\nHost: {}", self.request_target(), self.host)?;
        if self.port != self.scheme.default_port() {
            write!(out, ":{}", self.port)?;
        }
        out.write_str("\r\nUser-Agent: doorbell-rs\r\nAccept: */*\r\nConnection: close\r\n\r\n")
    }
}

pub struct RequestTarget<'a>(&'a str);

impl fmt::Display for RequestTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.starts_with('/') {
            f.write_str(self.0)
        } else {
            write!(f, "/{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};

    #[test]
    fn test_trigger_url_prefix_rule() {
        assert!(is_trigger_url("http://example.com/ring"));
        assert!(is_trigger_url("https://example.com"));
        assert!(is_trigger_url("http://"));
        assert!(!is_trigger_url(""));
        assert!(!is_trigger_url("ftp://example.com"));
        assert!(!is_trigger_url("example.com/ring"));
        assert!(!is_trigger_url("HTTP://example.com"));
    }

    #[test]
    fn test_parse_full_url() {
        let url = WebhookUrl::parse("http://user@hooks.local:8080/api/ring?id=42#top").unwrap();

        assert_eq!(url.scheme, Scheme::Http);
        assert_eq!(url.host, "hooks.local");
        assert_eq!(url.port, 8080);
        assert_eq!(url.request_target().to_string(), "/api/ring?id=42");
    }

    #[test]
    fn test_parse_defaults() {
        let url = WebhookUrl::parse("https://example.com").unwrap();
        assert_eq!(url.port, 443);
        assert_eq!(url.request_target().to_string(), "/");

        let url = WebhookUrl::parse("http://10.0.0.2?x=1").unwrap();
        assert_eq!(url.host, "10.0.0.2");
        assert_eq!(url.port, 80);
        assert_eq!(url.request_target().to_string(), "/?x=1");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(WebhookUrl::parse("http://"), Err(UrlError::MissingHost));
        assert_eq!(WebhookUrl::parse("http://:80/x"), Err(UrlError::MissingHost));
        assert_eq!(WebhookUrl::parse("http://host:http/"), Err(UrlError::InvalidPort));
        assert_eq!(WebhookUrl::parse("mqtt://host"), Err(UrlError::UnsupportedScheme));
    }

    #[test]
    fn test_get_request_head() {
        let url = WebhookUrl::parse("http://hooks.local:8080/ring?id=7").unwrap();
        let mut head = String::new();

        url.write_get_request(&mut head).unwrap();

        assert!(head.starts_with("GET /ring?id=7 HTTP/1.0\r\nHost: hooks.local:8080\r\n"));
        assert!(head.contains("Connection: close\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }
}
