use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::stream::{LiveStreamClient, StreamConfig};
use crate::core::types::Exchange;
use crate::exchanges::kraken::codec::KrakenStreamCodec;
use crate::exchanges::kraken::connector::KrakenConnector;
use crate::exchanges::kraken::signer::KrakenSigner;
use std::sync::Arc;

pub const MAINNET_API_URL: &str = "https://futures.kraken.com";
pub const MAINNET_WS_URL: &str = "wss://futures.kraken.com/ws/v1";

fn signer(credentials: &ExchangeCredentials) -> Result<Arc<KrakenSigner>, ExchangeError> {
    if !credentials.has_credentials() {
        return Err(ExchangeError::AuthError(
            "kraken_futures: API key and secret are required".to_string(),
        ));
    }
    Ok(Arc::new(KrakenSigner::new(
        credentials.api_key().to_string(),
        credentials.api_secret(),
    )?))
}

/// Build a Kraken Futures REST connector. Fails with `InvalidSecretEncoding`
/// when the secret is not base64.
pub fn build_connector(
    credentials: &ExchangeCredentials,
    settings: &ConnectorSettings,
) -> Result<KrakenConnector<ReqwestRest>, ExchangeError> {
    let signer = signer(credentials)?;
    let base_url = settings.base_url(Exchange::KrakenFutures, MAINNET_API_URL);
    let rest_config = RestClientConfig::new(base_url, Exchange::KrakenFutures.to_string())
        .with_timeout(settings.timeout_seconds);

    let rest = RestClientBuilder::new(rest_config)
        .with_signer(signer)
        .build()?;
    Ok(KrakenConnector::new(rest))
}

pub fn default_stream_config() -> StreamConfig {
    StreamConfig::new(MAINNET_WS_URL)
}

/// Build a live client for the `open_positions` and `balances` feeds.
/// The client is idle until `connect` is called.
pub fn build_stream_client(
    credentials: &ExchangeCredentials,
    config: StreamConfig,
) -> Result<LiveStreamClient<KrakenStreamCodec>, ExchangeError> {
    let codec = KrakenStreamCodec::new(signer(credentials)?);
    Ok(LiveStreamClient::new(Exchange::KrakenFutures, codec, config))
}
