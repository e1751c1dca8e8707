//! Speech synthesis endpoint client
//!
//! Requests `GET <base>tts?v=<version>&text=<text>` and streams the raw audio
//! body into a [`SpeechHandler`] without buffering it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::ClientError;
use crate::ports::{SpeechHandler, SpeechSynthesizer};
use crate::providers::query::{bearer, endpoint_url};
use crate::transport::{AudioStream, HttpTransport, TransportRequest};

/// HTTP client for the speech synthesis endpoint
#[derive(Debug, Clone)]
pub struct TtsClient {
    transport: HttpTransport,
    config: Arc<ClientConfig>,
    url: Url,
    diagnostics: Diagnostics,
}

impl TtsClient {
    /// Create a speech synthesis client
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the configuration is invalid
    /// and `ClientError::InvalidUrl` if no endpoint URL can be built from it.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Configuration)?;

        let transport = HttpTransport::new(Duration::from_millis(config.timeout_ms))?;
        let url = endpoint_url(&config, "tts")?;

        Ok(Self {
            transport,
            config,
            url,
            diagnostics: Diagnostics::default(),
        })
    }

    /// Attach a diagnostic sink receiving the resolved query string
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Diagnostics::new(sink);
        self
    }

    /// Endpoint URL for `text`
    #[must_use]
    pub fn request_url(&self, text: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("text", text);
        url
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(&self.config)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(self.config.language.tag()),
        );
        Ok(headers)
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsClient {
    #[instrument(skip(self, text, handler), fields(text_len = text.len()))]
    async fn synthesize(
        &self,
        text: &str,
        handler: &mut (dyn SpeechHandler + '_),
    ) -> Result<(), ClientError> {
        let url = self.request_url(text);
        self.diagnostics
            .emit("raw query", url.query().unwrap_or_default());

        let request = TransportRequest::new(Method::GET, url).with_headers(self.headers()?);
        let response = self.transport.execute(request).await?;

        let declared_len = match response.content_length() {
            Some(len) if len > 0 => len,
            _ => return Err(ClientError::EmptyResponse { endpoint: "tts" }),
        };

        if response.status() != StatusCode::OK {
            return Err(ClientError::RequestRejected {
                status: response.status_line(),
                body: String::new(),
            });
        }

        debug!(declared_len, "Streaming synthesized speech to handler");
        handler.handle(response.into_stream(), declared_len).await
    }
}

/// Handler collecting the whole stream in memory
#[derive(Debug, Default, Clone)]
pub struct AudioBuffer {
    data: Vec<u8>,
    declared_len: Option<u64>,
}

impl AudioBuffer {
    /// Create an empty buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            declared_len: None,
        }
    }

    /// Collected bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the collected bytes
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Length declared by the server, once handled
    #[must_use]
    pub const fn declared_len(&self) -> Option<u64> {
        self.declared_len
    }
}

#[async_trait]
impl SpeechHandler for AudioBuffer {
    async fn handle(
        &mut self,
        mut audio: AudioStream,
        declared_len: u64,
    ) -> Result<(), ClientError> {
        self.declared_len = Some(declared_len);
        self.data = audio.read_to_end().await?;
        Ok(())
    }
}
