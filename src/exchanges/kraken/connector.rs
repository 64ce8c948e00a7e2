use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::PerpetualsSource;
use crate::core::types::{Exchange, SnapshotCategory, SnapshotReport};
use crate::exchanges::kraken::conversions::{
    convert_accounts, convert_open_orders, convert_positions,
};
use crate::exchanges::kraken::rest::KrakenRest;
use async_trait::async_trait;
use tracing::{instrument, warn};

/// Kraken Futures REST pipeline. Open positions are required; orders and
/// account totals are optional.
pub struct KrakenConnector<R: RestClient> {
    rest: KrakenRest<R>,
}

impl<R: RestClient> KrakenConnector<R> {
    pub fn new(rest: R) -> Self {
        Self {
            rest: KrakenRest::new(rest),
        }
    }
}

#[async_trait]
impl<R: RestClient> PerpetualsSource for KrakenConnector<R> {
    fn exchange(&self) -> Exchange {
        Exchange::KrakenFutures
    }

    #[instrument(skip(self), fields(exchange = "kraken_futures"))]
    async fn fetch_snapshot(&self) -> Result<SnapshotReport, ExchangeError> {
        let (positions, orders, accounts) = tokio::join!(
            self.rest.open_positions(),
            self.rest.open_orders(),
            self.rest.accounts()
        );

        let mut report = SnapshotReport::new(Exchange::KrakenFutures);
        report.snapshot.positions = convert_positions(&positions?);

        match orders {
            Ok(payload) => report.snapshot.open_orders = convert_open_orders(&payload),
            Err(e) => {
                warn!("Open orders unavailable: {}", e);
                report.record_gap(SnapshotCategory::OpenOrders, e.to_string());
            }
        }

        match accounts {
            Ok(payload) => {
                let (available, locked, equity) = convert_accounts(&payload);
                report.snapshot.available_margin = available;
                report.snapshot.locked_margin = locked;
                report.snapshot.equity = equity;
            }
            Err(e) => {
                warn!("Accounts unavailable: {}", e);
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
