//! HTTP transport shared by the query and speech clients
//!
//! Performs exactly one request/response exchange per call. Status codes are
//! reported, never interpreted: deciding what counts as success is up to the
//! protocol adapters.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode, Url};
use tracing::{debug, instrument};

use crate::error::ClientError;

/// A fully formed outgoing request
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL including the query string
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Optional request body
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Create a request without headers or body
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach headers
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Thin wrapper around a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ClientError::Configuration(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self { client })
    }

    /// Send one request and return the response with its body still unread
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on network failure.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, ClientError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        debug!(
            status = %response.status(),
            content_length = ?response.content_length(),
            "Received response"
        );

        Ok(TransportResponse { inner: response })
    }
}

/// Response whose body has not been consumed yet
#[derive(Debug)]
pub struct TransportResponse {
    inner: Response,
}

impl TransportResponse {
    /// HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Status line as `<code> <reason>`, e.g. `200 OK`
    #[must_use]
    pub fn status_line(&self) -> String {
        let status = self.inner.status();
        match status.canonical_reason() {
            Some(reason) => format!("{} {reason}", status.as_u16()),
            None => status.as_u16().to_string(),
        }
    }

    /// Declared body length, `None` when the server did not announce one
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Read the whole body
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the body cannot be read.
    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        Ok(self.inner.bytes().await?)
    }

    /// Turn the body into a chunk stream
    #[must_use]
    pub fn into_stream(self) -> AudioStream {
        AudioStream {
            inner: self.inner,
            received: 0,
        }
    }
}

/// Open response body, read chunk by chunk
///
/// Dropping the stream releases the underlying connection, whether or not it
/// was read to the end.
#[derive(Debug)]
pub struct AudioStream {
    inner: Response,
    received: u64,
}

impl AudioStream {
    /// Next chunk of the body, `None` at end of stream
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the connection fails mid-body.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, ClientError> {
        let chunk = self.inner.chunk().await?;
        if let Some(bytes) = &chunk {
            self.received += bytes.len() as u64;
        }
        Ok(chunk)
    }

    /// Bytes read so far
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Drain the rest of the stream into memory
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the connection fails mid-body.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, ClientError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}
