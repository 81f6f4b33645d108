//! Minimal HTTP client.
//!
//! The APIs polled by the installation are plain `http://` JSON endpoints, so
//! one request per TCP connection is enough: send an HTTP/1.0 request with
//! `Connection: close`, read until the server hangs up, split head from body.

extern crate alloc;

use alloc::{format, string::String, vec::Vec};

use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, Stack};
use embassy_time::Duration;
use embedded_io_async::Write;

/// Largest response kept in memory.
pub const MAX_RESPONSE_LEN: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Errors raised below the HTTP status level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Only `http://` is spoken.
    UnsupportedScheme,
    InvalidUrl,
    Dns,
    Connect,
    Io,
    MalformedResponse,
    ResponseTooLarge,
}

impl core::fmt::Display for TransportError {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        let msg = match self {
            TransportError::UnsupportedScheme => "only http:// URLs are supported",
            TransportError::InvalidUrl => "invalid URL",
            TransportError::Dns => "DNS lookup failed",
            TransportError::Connect => "TCP connect failed",
            TransportError::Io => "socket read/write failed",
            TransportError::MalformedResponse => "malformed HTTP response",
            TransportError::ResponseTooLarge => "HTTP response too large",
        };
        f.write_str(msg)
    }
}

/// One outgoing request. JSON is the only content type used.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    pub bearer: Option<&'a str>,
    pub body: Option<&'a str>,
}

impl<'a> HttpRequest<'a> {
    pub fn get(url: &'a str) -> Self {
        Self {
            method: Method::Get,
            url,
            bearer: None,
            body: None,
        }
    }

    pub fn post_json(
        url: &'a str,
        body: &'a str,
    ) -> Self {
        Self {
            method: Method::Post,
            url,
            bearer: None,
            body: Some(body),
        }
    }

    pub fn with_bearer(
        mut self,
        token: &'a str,
    ) -> Self {
        self.bearer = Some(token);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests and reports whether the network is usable.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    fn is_connected(&self) -> bool;

    async fn send(
        &mut self,
        request: &HttpRequest<'_>,
    ) -> Result<HttpResponse, TransportError>;
}

/// Pieces of an `http://host[:port]/path` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Path and query, always starting with `/`.
    pub path: &'a str,
}

pub fn parse_url(url: &str) -> Result<Url<'_>, TransportError> {
    let rest = match url.strip_prefix("http://") {
        Some(rest) => rest,
        None if url.starts_with("https://") => return Err(TransportError::UnsupportedScheme),
        None => return Err(TransportError::InvalidUrl),
    };

    let split = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(split);
    let path = if path.is_empty() { "/" } else { path };
    if authority.contains('?') {
        return Err(TransportError::InvalidUrl);
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (
            host,
            port.parse::<u16>().map_err(|_| TransportError::InvalidUrl)?,
        ),
        None => (authority, 80),
    };
    if host.is_empty() {
        return Err(TransportError::InvalidUrl);
    }

    Ok(Url { host, port, path })
}

/// Serialize the request line, headers and body.
pub fn encode_request(
    request: &HttpRequest<'_>,
    url: &Url<'_>,
) -> String {
    let mut out = format!(
        "{} {} HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nContent-Type: application/json\r\nConnection: close\r\n",
        request.method.as_str(),
        url.path,
        url.host
    );
    if let Some(token) = request.bearer {
        out.push_str("Authorization: Bearer ");
        out.push_str(token);
        out.push_str("\r\n");
    }
    let body = request.body.unwrap_or("");
    if request.body.is_some() {
        out.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

/// Split a raw response into status code and body.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, TransportError> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or(TransportError::MalformedResponse)?;
    let head = core::str::from_utf8(&raw[..head_end]).map_err(|_| TransportError::MalformedResponse)?;
    let status_line = head.lines().next().unwrap_or("");

    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        return Err(TransportError::MalformedResponse);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(TransportError::MalformedResponse)?;

    let body = String::from_utf8_lossy(&raw[head_end + 4..]).into_owned();
    Ok(HttpResponse { status, body })
}

/// `HttpTransport` over an `embassy-net` stack.
pub struct EmbassyHttp {
    stack: Stack<'static>,
    timeout: Duration,
}

impl EmbassyHttp {
    pub fn new(
        stack: Stack<'static>,
        timeout: Duration,
    ) -> Self {
        Self { stack, timeout }
    }
}

impl HttpTransport for EmbassyHttp {
    fn is_connected(&self) -> bool {
        self.stack.is_link_up() && self.stack.is_config_up()
    }

    async fn send(
        &mut self,
        request: &HttpRequest<'_>,
    ) -> Result<HttpResponse, TransportError> {
        let url = parse_url(request.url)?;

        let addrs = self
            .stack
            .dns_query(url.host, DnsQueryType::A)
            .await
            .map_err(|error| {
                tracing::error!(?error, host = url.host, "DNS query failed");
                TransportError::Dns
            })?;
        let ip = *addrs.first().ok_or(TransportError::Dns)?;

        let (mut rx_buffer, mut tx_buffer) = ([0u8; 1024], [0u8; 1024]);
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(self.timeout));

        socket.connect((ip, url.port)).await.map_err(|error| {
            tracing::error!(?error, host = url.host, port = url.port, "TCP connect failed");
            TransportError::Connect
        })?;
        tracing::debug!(method = request.method.as_str(), url = request.url, "sending request");

        let head = encode_request(request, &url);
        socket
            .write_all(head.as_bytes())
            .await
            .map_err(|_| TransportError::Io)?;
        socket.flush().await.map_err(|_| TransportError::Io)?;

        let mut raw = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = socket.read(&mut chunk).await.map_err(|_| TransportError::Io)?;
            if n == 0 {
                break;
            }
            if raw.len() + n > MAX_RESPONSE_LEN {
                socket.abort();
                return Err(TransportError::ResponseTooLarge);
            }
            raw.extend_from_slice(&chunk[..n]);
        }
        socket.close();

        parse_response(&raw)
    }
}
