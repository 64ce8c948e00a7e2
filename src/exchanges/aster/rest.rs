use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use serde_json::Value;
use tracing::instrument;

/// Thin wrapper around `RestClient` for the Aster futures API
pub struct AsterRest<R: RestClient> {
    client: R,
}

impl<R: RestClient> AsterRest<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    /// Position risk for every symbol with a position
    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn position_risk(&self) -> Result<Value, ExchangeError> {
        self.client.get("/fapi/v2/positionRisk", &[], true).await
    }

    /// Account-level balances and margin totals
    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn account(&self) -> Result<Value, ExchangeError> {
        self.client.get("/fapi/v2/account", &[], true).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn open_orders(&self) -> Result<Value, ExchangeError> {
        self.client.get("/fapi/v1/openOrders", &[], true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{RestClientBuilder, RestClientConfig};
    use crate::exchanges::aster::AsterSigner;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wrappers_send_signed_requests() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for path in ["/fapi/v2/positionRisk", "/fapi/v2/account", "/fapi/v1/openOrders"] {
            mocks.push(
                server
                    .mock("GET", path)
                    .match_header("X-MBX-APIKEY", "key")
                    .match_query(Matcher::AllOf(vec![
                        Matcher::Regex("timestamp=".into()),
                        Matcher::Regex("signature=".into()),
                    ]))
                    .with_status(200)
                    .with_body(json!({"path": path}).to_string())
                    .create_async()
                    .await,
            );
        }

        let client = RestClientBuilder::new(RestClientConfig::new(server.url(), "aster".into()))
            .with_signer(Arc::new(AsterSigner::new("key".into(), "secret".into())))
            .build()
            .unwrap();
        let rest = AsterRest::new(client);

        assert_eq!(rest.position_risk().await.unwrap()["path"], "/fapi/v2/positionRisk");
        assert_eq!(rest.account().await.unwrap()["path"], "/fapi/v2/account");
        assert_eq!(rest.open_orders().await.unwrap()["path"], "/fapi/v1/openOrders");
        for mock in mocks {
            mock.assert_async().await;
        }
    }
}
