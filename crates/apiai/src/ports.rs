//! Port definitions for the agent clients
//!
//! Defines the traits implemented by the HTTP clients in `providers` and by
//! audio consumers such as the WAV file writer.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{Query, QueryResponse};
use crate::transport::AudioStream;

/// Port for natural-language query endpoints
///
/// # Example
///
/// ```ignore
/// use apiai::{QueryEndpoint, ClientError};
///
/// async fn reply(agent: &impl QueryEndpoint, text: &str) -> Result<String, ClientError> {
///     let response = agent.text_request("session-1", text).await?;
///     Ok(response.result.fulfillment.speech)
/// }
/// ```
#[async_trait]
pub trait QueryEndpoint: Send + Sync {
    /// Send a full query
    ///
    /// The query language is always replaced by the endpoint's configured
    /// language.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the exchange fails or the service rejects
    /// the request.
    async fn query(&self, query: Query) -> Result<QueryResponse, ClientError>;

    /// Send a single utterance
    ///
    /// # Arguments
    ///
    /// * `session_id` - Conversation identifier chosen by the caller
    /// * `text` - Utterance to resolve
    ///
    /// # Errors
    ///
    /// Same as [`QueryEndpoint::query`].
    async fn text_request(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<QueryResponse, ClientError> {
        self.query(Query::text(session_id, text)).await
    }
}

/// Consumer of a synthesized speech stream
///
/// Receives the open response body and the length declared by the server.
/// The stream is owned by the handler; the connection is released as soon as
/// the handler returns, on success or failure.
#[async_trait]
pub trait SpeechHandler: Send {
    /// Consume the audio stream
    ///
    /// # Arguments
    ///
    /// * `audio` - Open response body
    /// * `declared_len` - Content length announced by the server
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the audio cannot be read or stored.
    async fn handle(&mut self, audio: AudioStream, declared_len: u64) -> Result<(), ClientError>;
}

/// Port for text-to-speech endpoints
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and hand the audio to `handler`
    ///
    /// The handler is invoked exactly once on success, before this returns,
    /// and never when the request fails.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the exchange fails, the service rejects the
    /// request, or the handler fails.
    async fn synthesize(
        &self,
        text: &str,
        handler: &mut (dyn SpeechHandler + '_),
    ) -> Result<(), ClientError>;
}
