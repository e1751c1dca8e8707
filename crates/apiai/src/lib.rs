//! API.AI agent client
//!
//! Client for a hosted conversational agent:
//! - `QueryEndpoint` - Resolve natural-language text to an intent, parameters
//!   and a fulfillment
//! - `SpeechSynthesizer` - Turn text into 8 kHz linear PCM speech
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `providers` module contains the HTTP clients (adapters)
//! - `wav` persists synthesized speech as RIFF/WAVE files
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use apiai::{ClientConfig, Language, QueryClient, QueryEndpoint, TtsClient, SpeechSynthesizer, WavFileHandler};
//!
//! let config = Arc::new(ClientConfig::new(token, Language::English));
//!
//! // Ask the agent
//! let agent = QueryClient::new(config.clone())?;
//! let response = agent.text_request("session-1", "What's the weather?").await?;
//! println!("{}", response.result.fulfillment.speech);
//!
//! // Save speech to a file
//! let tts = TtsClient::new(config)?;
//! tts.synthesize("Hello!", &mut WavFileHandler::new("hello.wav")).await?;
//! ```

pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod language;
pub mod models;
pub mod ports;
pub mod providers;
pub mod transport;
pub mod wav;

pub use config::{CURRENT_API_VERSION, ClientConfig, DEFAULT_BASE_URL};
pub use diagnostics::{DiagnosticSink, NoopSink, TracingSink};
pub use error::{ClientError, DecodeError};
pub use language::{Language, is_supported};
pub use models::{
    DialogContext, Entity, EntityEntry, Event, Fulfillment, Location, Message, Metadata,
    Parameters, Query, QueryResponse, QueryResult, Speech, Status,
};
pub use ports::{QueryEndpoint, SpeechHandler, SpeechSynthesizer};
pub use providers::query::QueryClient;
pub use providers::tts::{AudioBuffer, TtsClient};
pub use transport::{AudioStream, HttpTransport, TransportRequest, TransportResponse};
pub use wav::{FieldOrder, PcmFormat, WavFileHandler, WavWriter, create_handler};
