use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use serde_json::Value;
use tracing::instrument;

/// Thin wrapper around `RestClient` for the MEXC contract API
pub struct MexcRest<R: RestClient> {
    client: R,
}

impl<R: RestClient> MexcRest<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        let payload = self.client.get(endpoint, params, authenticated).await?;
        check_envelope(payload)
    }

    #[instrument(skip(self), fields(exchange = "mexc"))]
    pub async fn open_positions(&self) -> Result<Value, ExchangeError> {
        self.get("/api/v1/private/position/open_positions", &[], true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "mexc"))]
    pub async fn open_orders(&self) -> Result<Value, ExchangeError> {
        self.get(
            "/api/v1/private/order/list/open_orders",
            &[("page_num", "1"), ("page_size", "100")],
            true,
        )
        .await
    }

    #[instrument(skip(self), fields(exchange = "mexc"))]
    pub async fn assets(&self) -> Result<Value, ExchangeError> {
        self.get("/api/v1/private/account/assets", &[], true).await
    }

    /// Public contract metadata for one symbol
    #[instrument(skip(self), fields(exchange = "mexc"))]
    pub async fn contract_detail(&self, symbol: &str) -> Result<Value, ExchangeError> {
        self.get("/api/v1/contract/detail", &[("symbol", symbol)], false)
            .await
    }
}

/// MEXC answers HTTP 200 with `{"success": false, "code": .., "message": ..}`
/// on failure.
pub fn check_envelope(payload: Value) -> Result<Value, ExchangeError> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ExchangeError::api("mexc", 200, payload.to_string()));
    }
    Ok(payload)
}
