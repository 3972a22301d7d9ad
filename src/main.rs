//! integration-hub
//!
//! Operator CLI for the integration layer: validates an endpoint config file
//! and probes endpoints through the full client stack (breaker, retries,
//! deadline), printing results and health as JSON.
//!
//! Credentials are read from `<ENDPOINT_ID>_TOKEN`, with the id uppercased and
//! `-` replaced by `_` (e.g. `crm-eu` → `CRM_EU_TOKEN`).

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use integration_hub::config::{load_config, IntegrationConfig};
use integration_hub::observability::{logging, metrics};
use integration_hub::{
    ConfigurationError, Credentials, IntegrationClient, IntegrationManager, IntegrationRequest,
};

#[derive(Parser)]
#[command(name = "integration-hub")]
#[command(about = "Probe and inspect configured integration endpoints", long_about = None)]
struct Cli {
    /// Endpoint configuration file.
    #[arg(short, long, default_value = "integrations.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config file and list endpoints
    Check,
    /// Send one GET to an endpoint and print the outcome
    Probe {
        endpoint: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Probe every endpoint and print health status
    Health {
        #[arg(long, default_value = "/health")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(
        config = %cli.config.display(),
        endpoints = config.endpoints.len(),
        "integration-hub v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Check => print_endpoints(&config)?,
        Commands::Probe { endpoint, path } => {
            let manager = IntegrationManager::from_config(&config);
            let client = build_client(&manager, &endpoint)?;
            let result = client.make_request(IntegrationRequest::get(path)).await;

            let outcome = match &result.outcome {
                Ok(response) => json!({ "success": true, "response": response }),
                Err(error) => json!({ "success": false, "error": error }),
            };
            let report = json!({
                "endpoint": client.id(),
                "result": outcome,
                "attempts": result.attempts,
                "elapsed_ms": result.elapsed.as_millis() as u64,
                "circuit_breaker": client.circuit_breaker_stats(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Health { path } => {
            let manager = IntegrationManager::from_config(&config);
            for endpoint in &config.endpoints {
                match build_client(&manager, &endpoint.id) {
                    Ok(client) => {
                        let _ = client.make_request(IntegrationRequest::get(path.as_str())).await;
                    }
                    Err(e) => tracing::warn!(endpoint = %endpoint.id, error = %e, "Skipping endpoint"),
                }
            }
            println!("{}", serde_json::to_string_pretty(&manager.get_health_status())?);
        }
    }

    Ok(())
}

fn print_endpoints(config: &IntegrationConfig) -> Result<(), serde_json::Error> {
    let endpoints: Vec<_> = config
        .endpoints
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "name": e.name,
                "service_type": e.service_type,
                "base_url": e.base_url,
                "timeout_ms": e.timeout_ms,
                "max_attempts": e.retry.max_attempts,
                "failure_threshold": e.circuit_breaker.failure_threshold,
                "credentials": credential_var(&e.id),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "valid": true, "endpoints": endpoints }))?);
    Ok(())
}

fn build_client(
    manager: &IntegrationManager,
    endpoint_id: &str,
) -> Result<Arc<IntegrationClient>, ConfigurationError> {
    let credentials = std::env::var(credential_var(endpoint_id))
        .ok()
        .filter(|v| !v.is_empty())
        .map(Credentials::token);
    manager.create_client(endpoint_id, credentials)
}

fn credential_var(endpoint_id: &str) -> String {
    format!("{}_TOKEN", endpoint_id.to_uppercase().replace('-', "_"))
}
