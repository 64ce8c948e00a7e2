use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::PerpetualsSource;
use crate::core::types::{Exchange, PerpetualsSnapshot, SnapshotCategory, SnapshotReport};
use crate::exchanges::hyperliquid::conversions::{
    convert_account, convert_open_orders, convert_perp_dexs, convert_positions,
};
use crate::exchanges::hyperliquid::rest::HyperliquidRest;
use crate::exchanges::hyperliquid::types::PerpDex;
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

/// Hyperliquid perpetuals pipeline.
///
/// Dexes are enumerated first, then every dex is queried concurrently. The
/// default dex's `clearinghouseState` is required; other dexes and open
/// orders degrade to gaps.
pub struct HyperliquidConnector<R: RestClient> {
    rest: HyperliquidRest<R>,
    address: String,
}

struct DexResult {
    dex: PerpDex,
    state: Result<serde_json::Value, ExchangeError>,
    orders: Result<serde_json::Value, ExchangeError>,
}

impl<R: RestClient> HyperliquidConnector<R> {
    pub fn new(rest: R, address: String) -> Self {
        Self {
            rest: HyperliquidRest::new(rest),
            address,
        }
    }

    async fn discover_dexes(&self, report: &mut SnapshotReport) -> Vec<PerpDex> {
        match self.rest.perp_dexs().await {
            Ok(payload) => convert_perp_dexs(&payload),
            Err(e) => {
                warn!("Perp dex discovery failed, using the default dex only: {}", e);
                report.record_gap(SnapshotCategory::Discovery, e.to_string());
                vec![PerpDex::default_dex()]
            }
        }
    }

    async fn fetch_dex(&self, dex: PerpDex) -> DexResult {
        let (state, orders) = tokio::join!(
            self.rest.clearinghouse_state(&self.address, &dex),
            self.rest.frontend_open_orders(&self.address, &dex)
        );
        DexResult { dex, state, orders }
    }
}

#[async_trait]
impl<R: RestClient> PerpetualsSource for HyperliquidConnector<R> {
    fn exchange(&self) -> Exchange {
        Exchange::Hyperliquid
    }

    #[instrument(skip(self), fields(exchange = "hyperliquid"))]
    async fn fetch_snapshot(&self) -> Result<SnapshotReport, ExchangeError> {
        let mut report = SnapshotReport::new(Exchange::Hyperliquid);
        let dexes = self.discover_dexes(&mut report).await;
        debug!(dex_count = dexes.len(), "Querying perp dexes");

        let results = join_all(dexes.into_iter().map(|dex| self.fetch_dex(dex))).await;

        for result in results {
            let mut snapshot = PerpetualsSnapshot::default();
            match result.state {
                Ok(state) => {
                    snapshot.positions = convert_positions(&state, &result.dex);
                    let (available, locked, equity) = convert_account(&state, &result.dex);
                    snapshot.available_margin = available;
                    snapshot.locked_margin = locked;
                    snapshot.equity = equity;
                }
                Err(e) if result.dex.is_default() => return Err(e),
                Err(e) => {
                    warn!(dex = %result.dex.name, "Clearinghouse state failed: {}", e);
                    let reason = format!("dex {}: {}", result.dex.name, e);
                    for category in [
                        SnapshotCategory::Positions,
                        SnapshotCategory::AvailableMargin,
                        SnapshotCategory::LockedMargin,
                        SnapshotCategory::Equity,
                    ] {
                        report.record_gap(category, reason.clone());
                    }
                }
            }

            match result.orders {
                Ok(orders) => snapshot.open_orders = convert_open_orders(&orders),
                Err(e) => {
                    warn!(dex = %result.dex.name, "Open orders failed: {}", e);
                    report.record_gap(
                        SnapshotCategory::OpenOrders,
                        format!("dex {}: {}", result.dex.name, e),
                    );
                }
            }

            report.snapshot.extend(snapshot);
        }

        Ok(report)
    }
}
