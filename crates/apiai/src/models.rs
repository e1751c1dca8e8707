//! Query request and response models
//!
//! Request types serialize to the JSON body of `POST /query`; response types
//! mirror the service's reply. Response types default every field so unknown
//! or missing keys never break decoding. Intent parameters stay as open JSON
//! values because their shape is defined by each agent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Open parameter mapping defined by the agent
pub type Parameters = HashMap<String, Value>;

/// Natural-language query sent to the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Input utterances, normally exactly one
    pub query: Vec<String>,

    /// Confidence per utterance, parallel to `query`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confidence: Vec<f32>,

    /// Contexts to activate for this request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<DialogContext>,

    /// Drop all server-side contexts before processing
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reset_contexts: bool,

    /// Trigger an intent by event instead of text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,

    /// Time zone of the user, e.g. `Europe/Paris`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Language tag; always replaced by the client's configured language
    #[serde(default)]
    pub lang: String,

    /// Caller-chosen conversation identifier
    pub session_id: String,

    /// Entity overrides for this request only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,

    /// User location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Query {
    /// Single-utterance query
    #[must_use]
    pub fn text(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            query: vec![text.into()],
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Event-triggered query without text input
    #[must_use]
    pub fn event(session_id: impl Into<String>, event: Event) -> Self {
        Self {
            event: Some(event),
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Add an alternative utterance with its confidence
    #[must_use]
    pub fn with_alternative(mut self, text: impl Into<String>, confidence: f32) -> Self {
        self.query.push(text.into());
        self.confidence.push(confidence);
        self
    }

    /// Activate a context
    #[must_use]
    pub fn with_context(mut self, context: DialogContext) -> Self {
        self.contexts.push(context);
        self
    }

    /// Reset server-side contexts before this request
    #[must_use]
    pub const fn with_reset_contexts(mut self) -> Self {
        self.reset_contexts = true;
        self
    }

    /// Set the user time zone
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Override an entity for this request
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Set the user location
    #[must_use]
    pub const fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude,
            longitude,
        });
        self
    }
}

/// Conversation state kept by the service between turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogContext {
    /// Context name
    #[serde(default)]
    pub name: String,
    /// Parameters carried by the context
    #[serde(default)]
    pub parameters: Parameters,
    /// Remaining turns the context stays active
    #[serde(default)]
    pub lifespan: u32,
}

impl DialogContext {
    /// Create a context without parameters
    #[must_use]
    pub fn new(name: impl Into<String>, lifespan: u32) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
            lifespan,
        }
    }

    /// Attach a parameter
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Named event that triggers an intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event name defined in the agent
    pub name: String,
    /// Event data
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl Event {
    /// Create an event without data
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: HashMap::new(),
        }
    }

    /// Attach a data field
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Geographic position of the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// Entity replacing a developer-defined entity for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Entity name as defined in the agent
    pub name: String,
    /// Entries of the entity
    pub entries: Vec<EntityEntry>,
    /// Extend instead of replacing the defined entries
    #[serde(default)]
    pub extend: bool,
    /// Entries have no reference values
    #[serde(default)]
    pub is_enum: bool,
}

/// Reference value with its synonyms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Reference value
    pub value: String,
    /// Synonyms for the value
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl EntityEntry {
    /// Create an entry
    #[must_use]
    pub fn new(value: impl Into<String>, synonyms: &[&str]) -> Self {
        Self {
            value: value.into(),
            synonyms: synonyms.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Reply to a query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResponse {
    /// Response id
    pub id: String,
    /// Server processing time
    pub timestamp: Option<DateTime<Utc>>,
    /// Outcome of the query
    pub result: QueryResult,
    /// Request status
    pub status: Status,
    /// Session id echoed from the request
    pub session_id: String,
}

/// Outcome computed by the agent
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResult {
    /// Origin of the answer, e.g. `agent` or `domains`
    pub source: String,
    /// Utterance the agent matched against
    pub resolved_query: String,
    /// Matched action
    pub action: String,
    /// The action needs more input before it can complete
    pub action_incomplete: bool,
    /// Extracted parameters
    pub parameters: Parameters,
    /// Contexts active after this turn
    pub contexts: Vec<DialogContext>,
    /// Response payload
    pub fulfillment: Fulfillment,
    /// Matched intent information
    pub metadata: Metadata,
    /// Matching score between 0 and 1
    pub score: Option<f64>,
}

/// Response payload of the matched intent
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fulfillment {
    /// Text to be spoken
    pub speech: String,
    /// Text to be displayed
    pub display_text: String,
    /// Origin of the fulfillment
    pub source: String,
    /// Custom payload
    pub data: Option<Value>,
    /// Rich response messages in display order
    pub messages: Vec<Message>,
}

/// One rich response message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message type, 0 for plain text
    #[serde(rename = "type")]
    pub kind: i64,
    /// Speech of a text message
    pub speech: Option<Speech>,
    /// Every other field of the message, kept as received
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Speech of a message: a single line or alternatives to choose from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Speech {
    /// One line
    Single(String),
    /// Alternatives
    Variants(Vec<String>),
}

impl Speech {
    /// First available line
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(text) => Some(text),
            Self::Variants(lines) => lines.first().map(String::as_str),
        }
    }
}

/// Matched intent information
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    /// Intent id
    pub intent_id: String,
    /// Intent name
    pub intent_name: String,
    /// A webhook produced the fulfillment
    #[serde(deserialize_with = "flag")]
    pub webhook_used: bool,
    /// A webhook was called during slot filling
    #[serde(deserialize_with = "flag")]
    pub webhook_for_slot_filling_used: bool,
}

/// Request status, present on every reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Status {
    /// Status code, HTTP semantics
    pub code: u16,
    /// Error classification, `success` on success
    pub error_type: String,
    /// Error id
    pub error_id: Option<String>,
    /// Error description
    pub error_details: Option<String>,
}

impl Status {
    /// Success iff the code is below 400
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code < 400
    }
}

/// Accept `true`, `"true"` and their negations
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}
