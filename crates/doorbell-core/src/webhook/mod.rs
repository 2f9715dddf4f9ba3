//! Webhook trigger client
//!
//! Issues one blocking HTTP GET to the configured trigger URL. Only transport
//! failures are retried, once, after a short pause; any HTTP status code
//! (including 4xx and 5xx) counts as a completed request.

mod response;
mod url;

pub use response::parse_response;
pub use url::{RequestTarget, Scheme, UrlError, WebhookUrl, is_trigger_url};

use alloc::string::String;

use embedded_hal_async::delay::DelayNs;
use log::{info, warn};
use thiserror_no_std::Error;

use crate::config::TRIGGER_RETRY_DELAY_MS;
use crate::wifi::Connectivity;

/// A completed HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: String::from(body),
        }
    }
}

/// Transport-level request failure; no HTTP status was received.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("sending request failed")]
    SendFailed,
    #[error("not connected")]
    NotConnected,
    #[error("connection lost")]
    ConnectionLost,
    #[error("no HTTP server")]
    NoHttpServer,
    #[error("host lookup failed")]
    DnsFailed,
    #[error("malformed URL")]
    InvalidUrl,
    #[error("TLS is not supported by this transport")]
    TlsUnsupported,
    #[error("read timeout")]
    ReadTimeout,
}

impl HttpError {
    /// Negative error code, in the numbering HTTP client libraries on these
    /// boards report and operators tend to search for.
    pub const fn code(self) -> i16 {
        match self {
            Self::ConnectionRefused => -1,
            Self::SendFailed => -2,
            Self::NotConnected => -4,
            Self::ConnectionLost => -5,
            Self::NoHttpServer => -7,
            Self::DnsFailed => -1,
            Self::InvalidUrl => -1,
            Self::TlsUnsupported => -1,
            Self::ReadTimeout => -11,
        }
    }
}

/// Outbound HTTP GET.
pub trait HttpTransport {
    fn get(&mut self, url: &str) -> impl Future<Output = Result<HttpResponse, HttpError>>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Wi-Fi is not connected")]
    NotConnected,
    #[error("no trigger URL configured")]
    EmptyUrl,
    #[error("request failed: {0} (code {})", .0.code())]
    Transport(HttpError),
}

pub struct WebhookClient<H: HttpTransport> {
    http: H,
}

impl<H: HttpTransport> WebhookClient<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    /// Send the webhook request for `url`.
    ///
    /// Preconditions are checked before touching the network: the station
    /// must be connected and `url` non-empty.
    pub async fn trigger<D: DelayNs>(
        &mut self,
        connectivity: Connectivity,
        url: &str,
        delay: &mut D,
    ) -> Result<HttpResponse, TriggerError> {
        if !connectivity.is_connected() {
            return Err(TriggerError::NotConnected);
        }
        if url.is_empty() {
            return Err(TriggerError::EmptyUrl);
        }

        info!("Triggering webhook: {}", url);
        let response = match self.http.get(url).await {
            Ok(response) => response,
            Err(first) => {
                warn!("Webhook request failed ({}), retrying once", first);
                delay.delay_ms(TRIGGER_RETRY_DELAY_MS).await;
                self.http.get(url).await.map_err(TriggerError::Transport)?
            }
        };

        info!("Webhook answered with status {}", response.status);
        Ok(response)
    }

    pub fn transport(&self) -> &H {
        &self.http
    }
}
