//! `pluto.toml` settings. Every key is optional; flags override them.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::OutputFormat;

const DEFAULT_CONFIG_FILE: &str = "pluto.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub parse: ParseConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ParseConfig {
    /// Use panic-mode recovery in `pluto check`.
    pub recover: bool,
    pub max_errors: NonZeroUsize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            recover: false,
            max_errors: NonZeroUsize::new(pluto_core::DEFAULT_MAX_ERRORS)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OutputConfig {
    pub format: Option<OutputFormat>,
    /// `tracing` filter directive, e.g. `warn` or `pluto_core=debug`.
    pub log_level: Option<String>,
}

/// Load `explicit`, or `./pluto.toml` when it exists, or defaults.
pub(crate) fn load(explicit: Option<&Path>) -> Result<Config, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                read_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    parse_config(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
