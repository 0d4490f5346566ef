//! Server configuration

use clap::{Parser, ValueEnum};
use geofire_query::{MalformedRecordPolicy, QueryConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Bearer token handling for the query endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Token ignored entirely
    #[default]
    None,
    /// Token verified when present; missing token accepted
    Optional,
    /// Valid token required
    Required,
}

/// What a cell branch does after a record fails to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MalformedPolicyArg {
    /// Drop the record and keep reading the cell
    #[default]
    Skip,
    /// Drop the record and stop reading the cell
    AbortBranch,
}

impl From<MalformedPolicyArg> for MalformedRecordPolicy {
    fn from(arg: MalformedPolicyArg) -> Self {
        match arg {
            MalformedPolicyArg::Skip => MalformedRecordPolicy::Skip,
            MalformedPolicyArg::AbortBranch => MalformedRecordPolicy::AbortBranch,
        }
    }
}

/// Resolved authentication settings
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// HS256 shared secret
    pub secret: Option<String>,
    /// Expected `iss` claim, if any
    pub issuer: Option<String>,
}

impl AuthConfig {
    /// Whether a missing token must be rejected
    pub fn is_required(&self) -> bool {
        self.mode == AuthMode::Required
    }
}

/// GeoFire HTTP server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "geofire-server")]
#[command(about = "Nearby-business query server over an H3 cell index")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "GEOFIRE_LISTEN_ADDR", default_value = "127.0.0.1:10000")]
    pub listen_addr: SocketAddr,

    /// JSON file used to seed the in-memory business store
    #[arg(long, env = "GEOFIRE_DATA_FILE", alias = "json-db-file")]
    pub data_file: Option<PathBuf>,

    /// Path to a TOML (or JSON) configuration file
    #[arg(long, env = "GEOFIRE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Enable CORS (Cross-Origin Resource Sharing)
    #[arg(
        long,
        env = "GEOFIRE_CORS_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GEOFIRE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Authentication mode for the query endpoint
    #[arg(long, env = "GEOFIRE_AUTH_MODE", default_value = "none", value_enum)]
    pub auth_mode: AuthMode,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "GEOFIRE_AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Required `iss` claim on bearer tokens
    #[arg(long, env = "GEOFIRE_AUTH_ISSUER")]
    pub auth_issuer: Option<String>,

    /// Seconds a query may run before partial results are returned
    #[arg(long, env = "GEOFIRE_QUERY_DEADLINE_SECS", default_value = "60")]
    pub query_deadline_secs: u64,

    /// Maximum records read per cell
    #[arg(long, env = "GEOFIRE_CELL_LIMIT", default_value = "20")]
    pub cell_limit: usize,

    /// Grid distance of the neighbor ring around the origin cell
    #[arg(long, env = "GEOFIRE_RING_RADIUS", default_value = "1")]
    pub ring_radius: u32,

    /// H3 resolution of the stored coarse cell field
    #[arg(long, env = "GEOFIRE_RESOLUTION", default_value = "7")]
    pub resolution: u8,

    /// Behavior when a stored record fails to decode
    #[arg(
        long,
        env = "GEOFIRE_MALFORMED_POLICY",
        default_value = "skip",
        value_enum
    )]
    pub malformed_policy: MalformedPolicyArg,
}

impl ServerConfig {
    /// Resolved authentication settings
    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            mode: self.auth_mode,
            secret: self.auth_secret.clone(),
            issuer: self.auth_issuer.clone(),
        }
    }

    /// Engine configuration derived from the query settings
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig::default()
            .with_cell_limit(self.cell_limit)
            .with_ring_radius(self.ring_radius)
            .with_coarse_resolution(self.resolution)
            .with_deadline(Duration::from_secs(self.query_deadline_secs))
            .with_malformed_policy(self.malformed_policy.into())
    }

    /// Check settings that clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.auth_mode != AuthMode::None && self.auth_secret.is_none() {
            return Err(format!(
                "auth mode {:?} requires --auth-secret (GEOFIRE_AUTH_SECRET)",
                self.auth_mode
            ));
        }
        if self.query_deadline_secs == 0 {
            return Err("query deadline must be at least one second".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 10000)),
            data_file: None,
            config_file: None,
            cors_enabled: true,
            log_level: "info".to_string(),
            auth_mode: AuthMode::None,
            auth_secret: None,
            auth_issuer: None,
            query_deadline_secs: 60,
            cell_limit: 20,
            ring_radius: 1,
            resolution: 7,
            malformed_policy: MalformedPolicyArg::Skip,
        }
    }
}
