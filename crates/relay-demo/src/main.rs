//! Reference relay client: pushes random sensor readings and prints the
//! commands the relay sends back.
//!
//! Usage:
//!   relay-demo --endpoint tcp://192.168.1.20:8899 --client-id gen-2
//!   relay-demo --config demo.toml
//!
//! Env vars (used when the matching flag is absent):
//!   RELAY_ENDPOINT   socket path or tcp://host:port
//!   RELAY_CLIENT_ID  client identifier
//!   RUST_LOG         log filter (default: info)

mod config;
mod sensor;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use relay_client::RelayClientBuilder;
use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;

/// Random-data telemetry client for the edge relay.
#[derive(Debug, Parser)]
#[command(name = "relay-demo", version, about)]
struct Cli {
    /// TOML file with `[relay]` and `[demo]` tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Relay endpoint: a socket path or `tcp://host:port`.
    #[arg(long)]
    endpoint: Option<String>,
    /// Client identifier sent to the relay.
    #[arg(long)]
    client_id: Option<String>,
    /// Seconds between samples.
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    if let Some(endpoint) = cli.endpoint.or_else(|| std::env::var("RELAY_ENDPOINT").ok()) {
        cfg.relay.endpoint = endpoint;
    }
    if let Some(id) = cli.client_id.or_else(|| std::env::var("RELAY_CLIENT_ID").ok()) {
        cfg.relay.client_id = id;
    }
    if cfg.relay.client_id.is_empty() {
        cfg.relay.client_id = "random_data_generator".into();
    }
    if let Some(secs) = cli.interval {
        cfg.demo.interval_secs = secs;
    }
    let interval = Duration::from_secs(cfg.demo.interval_secs.max(1));

    let client = RelayClientBuilder::new()
        .config(cfg.relay)
        .command_handler(sensor::handle_command)
        .build()?;

    tracing::info!(
        endpoint = %client.endpoint(),
        client_id = %client.client_id(),
        "starting relay demo"
    );
    client.start().await?;

    let mut rng = rand::thread_rng();
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting gracefully...");
                break;
            }
        }

        let reading = sensor::sample(&mut rng);
        println!(
            "Negative Number: {}, Weather: {}",
            reading["random_number_neg"],
            reading["random_weather"].as_str().unwrap_or_default()
        );

        if !client.is_connected() {
            tracing::debug!("not connected, sample dropped");
            continue;
        }
        if let Err(e) = client.send_telemetry_value(&reading).await {
            tracing::warn!(error = %e, code = e.code().as_i32(), "telemetry not sent");
        }
    }

    client.stop().await;
    Ok(())
}
