use super::types::{InfoRequest, PerpDex};
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use serde_json::Value;
use tracing::instrument;

/// Thin wrapper around `RestClient` for the Hyperliquid `/info` endpoint.
/// Account reads are public by address, so nothing here is signed.
pub struct HyperliquidRest<R: RestClient> {
    client: R,
}

impl<R: RestClient> HyperliquidRest<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    async fn info(&self, request: &InfoRequest) -> Result<Value, ExchangeError> {
        let body = serde_json::to_value(request).map_err(ExchangeError::JsonError)?;
        self.client.post("/info", &body, false).await
    }

    #[instrument(skip(self), fields(exchange = "hyperliquid"))]
    pub async fn perp_dexs(&self) -> Result<Value, ExchangeError> {
        self.info(&InfoRequest::PerpDexs).await
    }

    #[instrument(skip(self), fields(exchange = "hyperliquid", dex = %dex.name))]
    pub async fn clearinghouse_state(&self, user: &str, dex: &PerpDex) -> Result<Value, ExchangeError> {
        self.info(&InfoRequest::ClearinghouseState {
            user: user.to_string(),
            dex: dex.request_name(),
        })
        .await
    }

    #[instrument(skip(self), fields(exchange = "hyperliquid", dex = %dex.name))]
    pub async fn frontend_open_orders(&self, user: &str, dex: &PerpDex) -> Result<Value, ExchangeError> {
        self.info(&InfoRequest::FrontendOpenOrders {
            user: user.to_string(),
            dex: dex.request_name(),
        })
        .await
    }
}
