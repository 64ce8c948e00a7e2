use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::types::Exchange;
use crate::exchanges::aster::connector::AsterConnector;
use crate::exchanges::aster::signer::AsterSigner;
use std::sync::Arc;

pub const MAINNET_API_URL: &str = "https://fapi.asterdex.com";

/// Build an Aster connector from credentials and shared settings
pub fn build_connector(
    credentials: &ExchangeCredentials,
    settings: &ConnectorSettings,
) -> Result<AsterConnector<ReqwestRest>, ExchangeError> {
    if !credentials.has_credentials() {
        return Err(ExchangeError::AuthError(
            "aster: API key and secret are required".to_string(),
        ));
    }

    let base_url = settings.base_url(Exchange::Aster, MAINNET_API_URL);
    let rest_config = RestClientConfig::new(base_url, Exchange::Aster.to_string())
        .with_timeout(settings.timeout_seconds);
    let signer = Arc::new(AsterSigner::new(
        credentials.api_key().to_string(),
        credentials.api_secret().to_string(),
    ));

    let rest = RestClientBuilder::new(rest_config)
        .with_signer(signer)
        .build()?;
    Ok(AsterConnector::new(rest))
}
