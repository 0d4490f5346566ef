//! GeoFire server CLI
//!
//! Run with: `cargo run -p geofire-server -- --help`

use clap::{CommandFactory, FromArgMatches};
use geofire_server::{
    config_file::load_and_merge_config,
    telemetry::{init_logging, TelemetryConfig},
    GeoFireServer, ServerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // CLI + env first, then the config file fills whatever they left at default
    let matches = ServerConfig::command().get_matches();
    let mut config = ServerConfig::from_arg_matches(&matches)?;

    let merge_result = load_and_merge_config(&mut config, &matches);

    let telemetry_config = TelemetryConfig::with_server_config(&config);
    init_logging(&telemetry_config);

    if let Err(e) = merge_result {
        tracing::warn!(error = %e, "ignoring configuration file");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        data_file = ?config.data_file,
        cors = config.cors_enabled,
        auth_mode = ?config.auth_mode,
        deadline_secs = config.query_deadline_secs,
        malformed_policy = ?config.malformed_policy,
        log_format = ?telemetry_config.log_format,
        "Starting GeoFire server"
    );

    let server = GeoFireServer::new(config)?;
    server.run().await?;
    Ok(())
}
