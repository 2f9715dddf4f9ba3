//! Plain HTTP/1.0 GET over an embassy-net TCP socket

use alloc::vec::Vec;
use core::net::Ipv4Addr;

use doorbell_core::webhook::{
    HttpError, HttpResponse, HttpTransport, Scheme, WebhookUrl, parse_response,
};
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use embedded_io_async::Write;
use log::{debug, warn};

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_LEN: usize = 512;
const MAX_RESPONSE_LEN: usize = 2048;

pub struct TcpHttpTransport {
    stack: Stack<'static>,
}

impl TcpHttpTransport {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, HttpError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(ip));
        }

        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS lookup for {} failed: {:?}", host, e);
                HttpError::DnsFailed
            })?;
        addresses.first().copied().ok_or(HttpError::DnsFailed)
    }
}

impl HttpTransport for TcpHttpTransport {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        let url = WebhookUrl::parse(url).map_err(|e| {
            warn!("cannot request '{}': {}", url, e);
            HttpError::InvalidUrl
        })?;
        if url.scheme == Scheme::Https {
            warn!("https:// trigger URLs need TLS, which this build does not include");
            return Err(HttpError::TlsUnsupported);
        }
        if !self.stack.is_config_up() {
            return Err(HttpError::NotConnected);
        }

        let address = self.resolve(url.host).await?;

        let mut request: heapless::String<REQUEST_LEN> = heapless::String::new();
        url.write_get_request(&mut request)
            .map_err(|_| HttpError::SendFailed)?;

        let mut rx_buffer = [0u8; 1024];
        let mut tx_buffer = [0u8; 1024];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        debug!("GET {} via {}:{}", url.request_target(), address, url.port);
        socket.connect((address, url.port)).await.map_err(|e| {
            warn!("connect to {}:{} failed: {:?}", address, url.port, e);
            HttpError::ConnectionRefused
        })?;

        if let Err(e) = socket.write_all(request.as_bytes()).await {
            warn!("request write failed: {:?}", e);
            socket.abort();
            return Err(HttpError::SendFailed);
        }
        socket.flush().await.map_err(|_| HttpError::SendFailed)?;

        // HTTP/1.0 with `Connection: close`: the server ends the body by closing
        let mut raw = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            match socket.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    let room = MAX_RESPONSE_LEN.saturating_sub(raw.len());
                    raw.extend_from_slice(&chunk[..n.min(room)]);
                }
                Err(e) => {
                    warn!("response read failed after {} bytes: {:?}", raw.len(), e);
                    socket.abort();
                    if raw.is_empty() {
                        return Err(HttpError::ReadTimeout);
                    }
                    break;
                }
            }
        }
        socket.close();

        if raw.is_empty() {
            return Err(HttpError::ConnectionLost);
        }
        parse_response(&raw)
    }
}
