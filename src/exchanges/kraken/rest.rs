use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use serde_json::Value;
use tracing::instrument;

/// Thin wrapper around `RestClient` for Kraken Futures v3
pub struct KrakenRest<R: RestClient> {
    client: R,
}

impl<R: RestClient> KrakenRest<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    async fn signed_get(&self, endpoint: &str) -> Result<Value, ExchangeError> {
        let payload = self.client.get(endpoint, &[], true).await?;
        check_envelope(payload)
    }

    #[instrument(skip(self), fields(exchange = "kraken_futures"))]
    pub async fn open_positions(&self) -> Result<Value, ExchangeError> {
        self.signed_get("/derivatives/api/v3/openpositions").await
    }

    #[instrument(skip(self), fields(exchange = "kraken_futures"))]
    pub async fn open_orders(&self) -> Result<Value, ExchangeError> {
        self.signed_get("/derivatives/api/v3/openorders").await
    }

    #[instrument(skip(self), fields(exchange = "kraken_futures"))]
    pub async fn accounts(&self) -> Result<Value, ExchangeError> {
        self.signed_get("/derivatives/api/v3/accounts").await
    }
}

/// Kraken reports failures as `{"result": "error", "error": ..}` with HTTP 200.
pub fn check_envelope(payload: Value) -> Result<Value, ExchangeError> {
    if payload.get("result").and_then(Value::as_str) == Some("error") {
        return Err(ExchangeError::api("kraken_futures", 200, payload.to_string()));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_becomes_api_error() {
        let err = check_envelope(json!({"result": "error", "error": "authenticationError"}))
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
        assert!(err.to_string().contains("authenticationError"));

        let ok = json!({"result": "success", "openPositions": []});
        assert_eq!(check_envelope(ok.clone()).unwrap(), ok);
    }
}
