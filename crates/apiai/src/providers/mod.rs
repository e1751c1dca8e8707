//! HTTP clients for the agent endpoints

pub mod query;
pub mod tts;
