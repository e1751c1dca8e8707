//! Client configuration loading
//!
//! Sources, later ones winning:
//! 1. `apiai.toml` in the working directory (or the file given with `--config`)
//! 2. `APIAI_*` environment variables, e.g. `APIAI_ACCESS_TOKEN`
//! 3. Command-line overrides

use std::path::Path;

use apiai::ClientConfig;
use config::{Config, ConfigError, Environment, File};

const ENV_PREFIX: &str = "APIAI";

/// Command-line values that take precedence over files and environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub access_token: Option<String>,
    pub language: Option<String>,
    pub base_url: Option<String>,
}

/// Load the client configuration from the process environment
pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<ClientConfig, ConfigError> {
    load_with_env(file, Environment::with_prefix(ENV_PREFIX), overrides)
}

/// Load the client configuration reading variables from `env`
fn load_with_env(
    file: Option<&Path>,
    env: Environment,
    overrides: Overrides,
) -> Result<ClientConfig, ConfigError> {
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name("apiai").required(false),
    };

    Config::builder()
        .add_source(file_source)
        .add_source(env)
        .set_override_option("access_token", overrides.access_token)?
        .set_override_option("language", overrides.language)?
        .set_override_option("base_url", overrides.base_url)?
        .build()?
        .try_deserialize()
}
