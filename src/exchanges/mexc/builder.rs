use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::types::Exchange;
use crate::exchanges::mexc::connector::MexcConnector;
use crate::exchanges::mexc::signer::MexcSigner;
use governor::Quota;
use nonzero_ext::nonzero;
use std::sync::Arc;

pub const MAINNET_API_URL: &str = "https://contract.mexc.com";

/// Client-side ceiling; contract-detail lookups fan out per symbol.
pub fn default_quota() -> Quota {
    Quota::per_second(nonzero!(10u32))
}

pub fn build_connector(
    credentials: &ExchangeCredentials,
    settings: &ConnectorSettings,
) -> Result<MexcConnector<ReqwestRest>, ExchangeError> {
    if !credentials.has_credentials() {
        return Err(ExchangeError::AuthError(
            "mexc: API key and secret are required".to_string(),
        ));
    }

    let base_url = settings.base_url(Exchange::Mexc, MAINNET_API_URL);
    let rest_config = RestClientConfig::new(base_url, Exchange::Mexc.to_string())
        .with_timeout(settings.timeout_seconds)
        .with_rate_limit(default_quota());
    let signer = Arc::new(MexcSigner::new(
        credentials.api_key().to_string(),
        credentials.api_secret().to_string(),
    ));

    let rest = RestClientBuilder::new(rest_config)
        .with_signer(signer)
        .build()?;
    Ok(MexcConnector::new(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_key_and_secret() {
        let credentials = ExchangeCredentials::new(Exchange::Mexc, String::new(), "secret".into());
        assert!(matches!(
            build_connector(&credentials, &ConnectorSettings::default()),
            Err(ExchangeError::AuthError(_))
        ));

        let credentials = ExchangeCredentials::new(Exchange::Mexc, "key".into(), "secret".into());
        assert!(build_connector(&credentials, &ConnectorSettings::default()).is_ok());
    }
}
