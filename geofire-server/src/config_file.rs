//! Configuration file support.
//!
//! Loads server settings from a `[server]` section in `geofire.toml` (or a
//! JSON file with the same shape) and merges them under CLI arguments and
//! environment variables.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Config file (`[server]`)
//! 4. Hardcoded defaults

use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AuthMode, MalformedPolicyArg, ServerConfig};

/// File looked up in the working directory when `--config-file` is not given
pub const DEFAULT_CONFIG_FILE: &str = "geofire.toml";

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

// ---------------------------------------------------------------------------
// File config serde types (all Option, absence means "not set in file")
// ---------------------------------------------------------------------------

/// Top-level config file structure. Unknown sections are tolerated.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeoFireFileConfig {
    #[serde(default)]
    pub server: Option<ServerFileConfig>,
}

/// The `[server]` section
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ServerFileConfig {
    pub listen_addr: Option<String>,
    pub data_file: Option<String>,
    pub log_level: Option<String>,
    pub cors_enabled: Option<bool>,

    /// `[server.auth]`
    #[serde(default)]
    pub auth: Option<AuthFileConfig>,

    /// `[server.query]`
    #[serde(default)]
    pub query: Option<QueryFileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AuthFileConfig {
    pub mode: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct QueryFileConfig {
    pub deadline_secs: Option<u64>,
    pub cell_limit: Option<usize>,
    pub ring_radius: Option<u32>,
    pub resolution: Option<u8>,
    pub malformed_policy: Option<String>,
}

// ---------------------------------------------------------------------------
// Config file loading
// ---------------------------------------------------------------------------

/// Load a config file. `.json` is parsed as JSON, everything else as TOML.
pub fn load_config(path: &Path) -> Result<GeoFireFileConfig, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    } else {
        toml::from_str(&text).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigFileError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Resolve which config file to read: an explicit path wins, otherwise
/// `geofire.toml` in the working directory if present.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

// ---------------------------------------------------------------------------
// Apply file config to ServerConfig (value_source gating)
// ---------------------------------------------------------------------------

/// All clap arg IDs referenced by `apply_to_server_config`.
pub const CONFIG_FILE_ARG_IDS: &[&str] = &[
    "listen_addr",
    "data_file",
    "log_level",
    "cors_enabled",
    "auth_mode",
    "auth_issuer",
    "query_deadline_secs",
    "cell_limit",
    "ring_radius",
    "resolution",
    "malformed_policy",
];

/// Apply config file values to a `ServerConfig`, but only for fields where
/// the user did NOT provide a CLI argument or environment variable.
pub fn apply_to_server_config(
    file: &ServerFileConfig,
    config: &mut ServerConfig,
    matches: &ArgMatches,
) {
    use clap::parser::ValueSource;

    // Arg IDs are the field names (underscores), not the kebab-case flags.
    let is_default = |arg_name: &str| -> bool {
        matches!(
            matches.value_source(arg_name),
            None | Some(ValueSource::DefaultValue)
        )
    };

    if is_default("listen_addr") {
        if let Some(ref addr_str) = file.listen_addr {
            match addr_str.parse::<SocketAddr>() {
                Ok(addr) => config.listen_addr = addr,
                Err(_) => warn!(
                    value = addr_str,
                    "Invalid listen_addr in config file, ignoring"
                ),
            }
        }
    }
    if is_default("data_file") {
        if let Some(ref path) = file.data_file {
            config.data_file = Some(PathBuf::from(path));
        }
    }
    if is_default("log_level") {
        if let Some(ref level) = file.log_level {
            config.log_level = level.clone();
        }
    }
    if is_default("cors_enabled") {
        if let Some(v) = file.cors_enabled {
            config.cors_enabled = v;
        }
    }

    if let Some(ref auth) = file.auth {
        if is_default("auth_mode") {
            if let Some(ref mode) = auth.mode {
                match parse_auth_mode(mode) {
                    Some(m) => config.auth_mode = m,
                    None => warn!(value = mode, "Invalid auth mode in config file, ignoring"),
                }
            }
        }
        if is_default("auth_issuer") && auth.issuer.is_some() {
            config.auth_issuer = auth.issuer.clone();
        }
    }

    if let Some(ref query) = file.query {
        if is_default("query_deadline_secs") {
            if let Some(v) = query.deadline_secs {
                config.query_deadline_secs = v;
            }
        }
        if is_default("cell_limit") {
            if let Some(v) = query.cell_limit {
                config.cell_limit = v;
            }
        }
        if is_default("ring_radius") {
            if let Some(v) = query.ring_radius {
                config.ring_radius = v;
            }
        }
        if is_default("resolution") {
            if let Some(v) = query.resolution {
                config.resolution = v;
            }
        }
        if is_default("malformed_policy") {
            if let Some(ref policy) = query.malformed_policy {
                match parse_malformed_policy(policy) {
                    Some(p) => config.malformed_policy = p,
                    None => warn!(
                        value = policy,
                        "Invalid malformed_policy in config file, ignoring"
                    ),
                }
            }
        }
    }
}

fn parse_auth_mode(s: &str) -> Option<AuthMode> {
    match s.to_lowercase().as_str() {
        "none" => Some(AuthMode::None),
        "optional" => Some(AuthMode::Optional),
        "required" => Some(AuthMode::Required),
        _ => None,
    }
}

fn parse_malformed_policy(s: &str) -> Option<MalformedPolicyArg> {
    match s.to_lowercase().replace('_', "-").as_str() {
        "skip" => Some(MalformedPolicyArg::Skip),
        "abort-branch" | "abort" => Some(MalformedPolicyArg::AbortBranch),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Top-level entry point
// ---------------------------------------------------------------------------

/// Load the config file (if any) and merge its values into `config`.
pub fn load_and_merge_config(
    config: &mut ServerConfig,
    matches: &ArgMatches,
) -> Result<(), ConfigFileError> {
    let Some(path) = resolve_config_path(config.config_file.as_deref()) else {
        debug!("No config file found, using CLI args and defaults only");
        return Ok(());
    };

    info!(path = %path.display(), "Loading configuration file");

    let file_config = load_config(&path)?;
    if let Some(server) = file_config.server {
        apply_to_server_config(&server, config, matches);
    }

    Ok(())
}
