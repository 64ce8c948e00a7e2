use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::PerpetualsSource;
use crate::core::types::{Exchange, SnapshotCategory, SnapshotReport};
use crate::exchanges::mexc::conversions::{
    convert_assets, convert_contract_size, convert_open_orders, convert_positions, symbols,
    ContractSizes,
};
use crate::exchanges::mexc::rest::MexcRest;
use crate::exchanges::mexc::schema;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// MEXC perpetuals pipeline.
///
/// Positions, orders and assets are fetched together; contract sizes for
/// every referenced symbol are then looked up (rate limited by the client)
/// before volumes are converted to base units.
pub struct MexcConnector<R: RestClient> {
    rest: MexcRest<R>,
}

impl<R: RestClient> MexcConnector<R> {
    pub fn new(rest: R) -> Self {
        Self {
            rest: MexcRest::new(rest),
        }
    }

    async fn contract_sizes(
        &self,
        symbols: BTreeSet<String>,
        report: &mut SnapshotReport,
    ) -> ContractSizes {
        let lookups = join_all(symbols.into_iter().map(|symbol| async move {
            let detail = self.rest.contract_detail(&symbol).await;
            (symbol, detail)
        }))
        .await;

        let mut sizes = ContractSizes::new();
        for (symbol, detail) in lookups {
            let size = detail
                .map_err(|e| e.to_string())
                .and_then(|payload| {
                    convert_contract_size(&payload, &symbol)
                        .ok_or_else(|| "no contractSize in response".to_string())
                });
            match size {
                Ok(size) => {
                    sizes.insert(symbol, size);
                }
                Err(reason) => {
                    warn!(%symbol, "Contract size unknown, assuming 1: {}", reason);
                    report.record_gap(
                        SnapshotCategory::Discovery,
                        format!("contract size for {}: {}", symbol, reason),
                    );
                }
            }
        }
        sizes
    }
}

#[async_trait]
impl<R: RestClient> PerpetualsSource for MexcConnector<R> {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    #[instrument(skip(self), fields(exchange = "mexc"))]
    async fn fetch_snapshot(&self) -> Result<SnapshotReport, ExchangeError> {
        let (positions, orders, assets) = tokio::join!(
            self.rest.open_positions(),
            self.rest.open_orders(),
            self.rest.assets()
        );
        let positions = positions?;

        let mut report = SnapshotReport::new(Exchange::Mexc);

        let orders: Option<Value> = match orders {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Open orders unavailable: {}", e);
                report.record_gap(SnapshotCategory::OpenOrders, e.to_string());
                None
            }
        };

        let mut referenced = symbols(&positions, schema::POSITION_SHAPES);
        if let Some(orders) = &orders {
            referenced.extend(symbols(orders, schema::ORDER_SHAPES));
        }
        debug!(symbols = referenced.len(), "Looking up contract sizes");
        let sizes = self.contract_sizes(referenced, &mut report).await;

        report.snapshot.positions = convert_positions(&positions, &sizes);
        if let Some(orders) = &orders {
            report.snapshot.open_orders = convert_open_orders(orders, &sizes);
        }

        match assets {
            Ok(payload) => {
                let (available, locked, equity) = convert_assets(&payload);
                report.snapshot.available_margin = available;
                report.snapshot.locked_margin = locked;
                report.snapshot.equity = equity;
            }
            Err(e) => {
                warn!("Assets unavailable: {}", e);
                let reason = e.to_string();
                for category in [
                    SnapshotCategory::AvailableMargin,
                    SnapshotCategory::LockedMargin,
                    SnapshotCategory::Equity,
                ] {
                    report.record_gap(category, reason.clone());
                }
            }
        }

        Ok(report)
    }
}
