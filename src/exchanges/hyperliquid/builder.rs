use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::types::Exchange;
use crate::exchanges::hyperliquid::connector::HyperliquidConnector;

pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";

/// Build a Hyperliquid connector. Only an account address is needed.
pub fn build_connector(
    credentials: &ExchangeCredentials,
    settings: &ConnectorSettings,
) -> Result<HyperliquidConnector<ReqwestRest>, ExchangeError> {
    let address = credentials.account_address().ok_or_else(|| {
        ExchangeError::AuthError("hyperliquid: a wallet address is required".to_string())
    })?;

    let base_url = settings.base_url(Exchange::Hyperliquid, MAINNET_API_URL);
    let rest_config = RestClientConfig::new(base_url, Exchange::Hyperliquid.to_string())
        .with_timeout(settings.timeout_seconds);
    let rest = RestClientBuilder::new(rest_config).build()?;

    Ok(HyperliquidConnector::new(rest, address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_required() {
        let credentials = ExchangeCredentials::new(Exchange::Hyperliquid, String::new(), String::new());
        assert!(matches!(
            build_connector(&credentials, &ConnectorSettings::default()),
            Err(ExchangeError::AuthError(_))
        ));

        let credentials = ExchangeCredentials::wallet(Exchange::Hyperliquid, "0xabc");
        assert!(build_connector(&credentials, &ConnectorSettings::default()).is_ok());
    }
}
