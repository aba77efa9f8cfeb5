//! Blocking HTTP transport
//!
//! The client issues plain GET requests and only needs the status, the
//! headers and the raw body back. [`HttpTransport`] is the seam used to swap
//! the network for a stub in tests.

use crate::error::UpstreamError;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "PMOMusic/0.3.10 (pmoaudioaddict)";

/// Raw HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A 200 response with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body bytes, gunzipped when `Content-Encoding` says so
    pub fn decoded_body(&self) -> Result<Vec<u8>, UpstreamError> {
        let gzipped = self
            .header("content-encoding")
            .map(|enc| enc.split(',').any(|e| e.trim().eq_ignore_ascii_case("gzip")))
            .unwrap_or(false);

        if !gzipped {
            return Ok(self.body.clone());
        }

        let mut decoded = Vec::new();
        GzDecoder::new(self.body.as_slice()).read_to_end(&mut decoded)?;
        debug!(
            "Decompressed gzip body: {} -> {} bytes",
            self.body.len(),
            decoded.len()
        );
        Ok(decoded)
    }
}

/// Something that can perform a blocking HTTP GET
pub trait HttpTransport {
    /// Fetch `url` with extra request headers.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, UpstreamError>;
}

/// [`HttpTransport`] backed by `reqwest::blocking`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with a timeout, User-Agent and optional proxy
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        proxy: Option<&str>,
    ) -> Result<Self, UpstreamError> {
        // gzip stays off in reqwest: the batch endpoint is decoded explicitly
        let mut builder = Client::builder().user_agent(user_agent).timeout(timeout);

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing blocking client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, UpstreamError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes()?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_body_is_untouched() {
        let response = HttpResponse::ok("[1,2]");
        assert_eq!(response.decoded_body().unwrap(), b"[1,2]");
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let response = HttpResponse::ok(gzip(b"{\"a\":1}")).with_header("Content-Encoding", "gzip");
        assert_eq!(response.header("content-encoding"), Some("gzip"));
        assert_eq!(response.decoded_body().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_gzip_is_not_assumed() {
        // Compressed bytes without the marker are returned as-is
        let raw = gzip(b"hello");
        let response = HttpResponse::ok(raw.clone());
        assert_eq!(response.decoded_body().unwrap(), raw);
    }

    #[test]
    fn test_corrupt_gzip_fails() {
        let response = HttpResponse::ok("not gzip").with_header("content-encoding", "gzip");
        assert!(matches!(
            response.decoded_body(),
            Err(UpstreamError::Decode(_))
        ));
    }

    #[test]
    fn test_success_range() {
        let mut response = HttpResponse::ok("");
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }
}
