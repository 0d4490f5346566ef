//! GeoFire CLI library.
//!
//! Types and the HTTP client behind the `geofire` binary.

pub mod cli;
pub mod client;
pub mod error;
pub mod output;

use cli::{Cli, Commands};
use client::NearbyClient;
use error::CliResult;
use geofire_query::{GeoPoint, QueryRequest};
use std::time::Duration;

/// Dispatch a parsed [`Cli`] to the appropriate command.
pub async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Nearby {
            latitude,
            longitude,
            order_by,
            filter,
            timeout_secs,
            json,
        } => {
            let origin = GeoPoint::new(latitude, longitude)
                .map_err(|e| error::CliError::Usage(e.to_string()))?;
            let request = QueryRequest::at(origin)
                .with_order_by(order_by.into())
                .with_filter_distance(filter.into());

            let client = NearbyClient::new(
                &cli.server,
                cli.token,
                Duration::from_secs(timeout_secs),
            )?;
            let result = client.nearby(&request).await?;
            tracing::info!(
                results = result.response.businesses.len(),
                elapsed_ms = ?result.elapsed_ms,
                "nearby query complete"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&result.response)?);
            } else {
                print!(
                    "{}",
                    output::render_businesses(&result.response.businesses, result.elapsed_ms)
                );
            }
            Ok(())
        }

        Commands::Health => {
            let client = NearbyClient::new(&cli.server, cli.token, Duration::from_secs(10))?;
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }

        Commands::Stats => {
            let client = NearbyClient::new(&cli.server, cli.token, Duration::from_secs(10))?;
            let stats = client.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}
