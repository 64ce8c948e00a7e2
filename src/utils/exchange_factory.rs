use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::traits::PerpetualsSource;
use crate::core::types::Exchange;
use crate::exchanges::{aster, hyperliquid, kraken, mexc};

/// Factory for creating perpetuals connectors
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Create the snapshot source for `exchange`.
    ///
    /// Fails with `AuthError` when required credentials are missing and with
    /// `InvalidSecretEncoding` when a Kraken secret is not base64.
    pub fn create_source(
        exchange: Exchange,
        credentials: &ExchangeCredentials,
        settings: &ConnectorSettings,
    ) -> Result<Box<dyn PerpetualsSource>, ExchangeError> {
        match exchange {
            Exchange::Aster => Ok(Box::new(aster::build_connector(credentials, settings)?)),
            Exchange::Hyperliquid => Ok(Box::new(hyperliquid::build_connector(
                credentials,
                settings,
            )?)),
            Exchange::KrakenFutures => Ok(Box::new(kraken::build_connector(credentials, settings)?)),
            Exchange::Mexc => Ok(Box::new(mexc::build_connector(credentials, settings)?)),
        }
    }

    pub fn supported_exchanges() -> &'static [Exchange] {
        &Exchange::ALL
    }
}
