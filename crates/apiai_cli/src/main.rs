//! API.AI CLI
//!
//! Send text queries to an agent and save synthesized speech to WAV files.

#![allow(clippy::print_stdout)]

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use apiai::{
    FieldOrder, Language, QueryClient, QueryEndpoint, QueryResponse, SpeechSynthesizer,
    TracingSink, TtsClient, WavFileHandler,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Overrides;

/// API.AI CLI
#[derive(Debug, Parser)]
#[command(name = "apiai")]
#[command(author, version, about = "API.AI agent client", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Echo request and response bodies (shown with -vv)
    #[arg(long)]
    wire: bool,

    /// Configuration file (default: ./apiai.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client access token
    #[arg(long, env = "APIAI_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Agent language, e.g. en, de, pt-BR
    #[arg(short, long)]
    lang: Option<String>,

    /// API base URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a text query to the agent
    Query {
        /// Text to resolve
        text: String,

        /// Conversation id (random if not given)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Synthesize speech and save it as a WAV file
    ///
    /// Example: apiai tts "Hello there" --output hello.wav
    Tts {
        /// Text to speak
        text: String,

        /// Output WAV file
        #[arg(short, long, default_value = "speech.wav")]
        output: PathBuf,

        /// Write the format chunk fields little-endian
        #[arg(long)]
        little_endian: bool,
    },

    /// List supported languages
    Languages,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Human-readable summary of a query response
fn render_response(response: &QueryResponse) -> String {
    let result = &response.result;
    let mut out = format!("Speech: {}\n", result.fulfillment.speech);

    if !result.action.is_empty() {
        out.push_str(&format!("Action: {}", result.action));
        if result.action_incomplete {
            out.push_str(" (incomplete)");
        }
        out.push('\n');
    }

    if !result.metadata.intent_name.is_empty() {
        out.push_str(&format!("Intent: {}\n", result.metadata.intent_name));
    }

    let mut names: Vec<_> = result.parameters.keys().collect();
    names.sort();
    for name in names {
        out.push_str(&format!("  {name} = {}\n", result.parameters[name]));
    }

    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if matches!(cli.command, Commands::Languages) {
        for lang in Language::ALL {
            println!("{lang}");
        }
        return Ok(());
    }

    let config = settings::load(
        cli.config.as_deref(),
        Overrides {
            access_token: cli.token,
            language: cli.lang,
            base_url: cli.base_url,
        },
    )?;
    let config = Arc::new(config);

    match cli.command {
        Commands::Query { text, session } => {
            let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let mut client = QueryClient::new(config)?;
            if cli.wire {
                client = client.with_diagnostics(Arc::new(TracingSink));
            }

            let response = client.text_request(&session, &text).await?;
            print!("{}", render_response(&response));
        },

        Commands::Tts {
            text,
            output,
            little_endian,
        } => {
            let mut client = TtsClient::new(config)?;
            if cli.wire {
                client = client.with_diagnostics(Arc::new(TracingSink));
            }

            let order = if little_endian {
                FieldOrder::LittleEndian
            } else {
                FieldOrder::BigEndian
            };
            let mut handler = WavFileHandler::new(&output).with_field_order(order);

            client.synthesize(&text, &mut handler).await?;
            info!(path = %output.display(), "Speech saved");
            println!("Saved {}", output.display());
        },

        Commands::Languages => {},
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn log_filter_verbosity_levels() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn cli_parses_query_command() {
        let cli = parse_args(&["apiai", "--lang", "de", "query", "hallo", "-s", "42"]).unwrap();

        assert_eq!(cli.lang.as_deref(), Some("de"));
        match cli.command {
            Commands::Query { text, session } => {
                assert_eq!(text, "hallo");
                assert_eq!(session.as_deref(), Some("42"));
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_tts_command_with_defaults() {
        let cli = parse_args(&["apiai", "tts", "Hello"]).unwrap();

        match cli.command {
            Commands::Tts {
                text,
                output,
                little_endian,
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(output, PathBuf::from("speech.wav"));
                assert!(!little_endian);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(parse_args(&["apiai"]).is_err());
    }

    #[test]
    fn cli_counts_verbosity() {
        let cli = parse_args(&["apiai", "-vv", "--wire", "languages"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.wire);
    }

    #[test]
    fn render_response_lists_sorted_parameters() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "result": {
                "action": "book",
                "actionIncomplete": true,
                "parameters": {"time": "8pm", "guests": 2},
                "fulfillment": {"speech": "For how many?"},
                "metadata": {"intentName": "Booking"}
            },
            "status": {"code": 200}
        }))
        .unwrap();

        assert_eq!(
            render_response(&response),
            "Speech: For how many?\nAction: book (incomplete)\nIntent: Booking\n  guests = 2\n  time = \"8pm\"\n"
        );
    }
}
