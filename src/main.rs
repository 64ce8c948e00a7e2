use anyhow::{bail, Context, Result};
use perpscope::core::config::ExchangeCredentials;
use perpscope::core::types::Exchange;
use perpscope::exchanges::kraken;
use perpscope::{AggregatorConfig, ConnectorAggregator};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("perpscope=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => snapshot().await,
        [flag, exchange] if flag == "--stream" => stream(exchange).await,
        _ => bail!("usage: perpscope [--stream kraken]"),
    }
}

/// Fetch every exchange with credentials in the environment and print JSON.
async fn snapshot() -> Result<()> {
    let credentials = ExchangeCredentials::all_from_env();
    if credentials.is_empty() {
        bail!("no exchange credentials found in the environment");
    }
    info!(exchanges = credentials.len(), "Fetching perpetuals snapshots");

    let aggregate = ConnectorAggregator::new(AggregatorConfig::default())
        .aggregate_all(&credentials)
        .await;

    let failures: BTreeMap<Exchange, String> = aggregate
        .failures
        .iter()
        .map(|(exchange, e)| (*exchange, e.to_string()))
        .collect();
    let output = json!({
        "reports": aggregate.reports,
        "failures": failures,
        "merged": aggregate.merged(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Follow the Kraken Futures private feeds until Ctrl-C.
async fn stream(exchange: &str) -> Result<()> {
    let exchange: Exchange = exchange.parse()?;
    if exchange != Exchange::KrakenFutures {
        bail!("live streaming is only available for kraken_futures");
    }

    let credentials = ExchangeCredentials::all_from_env()
        .remove(&exchange)
        .context("KRAKEN_FUTURES_API_KEY and KRAKEN_FUTURES_API_SECRET must be set")?;
    let mut client = kraken::build_stream_client(&credentials, kraken::default_stream_config())?;

    let printer = client.on_state(|state| match serde_json::to_string(state) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!("Failed to encode state: {}", e),
    });
    client.connect();

    tokio::signal::ctrl_c().await?;
    client.disconnect().await;
    printer.abort();
    Ok(())
}
