use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::PerpetualsSource;
use crate::core::types::{Exchange, SnapshotCategory, SnapshotReport};
use crate::exchanges::aster::conversions::{convert_account, convert_open_orders, convert_positions};
use crate::exchanges::aster::rest::AsterRest;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Aster perpetuals pipeline.
///
/// `positionRisk` is required; the account and open-order calls degrade to
/// recorded gaps.
pub struct AsterConnector<R: RestClient> {
    rest: AsterRest<R>,
}

impl<R: RestClient> AsterConnector<R> {
    pub fn new(rest: R) -> Self {
        Self {
            rest: AsterRest::new(rest),
        }
    }
}

#[async_trait]
impl<R: RestClient> PerpetualsSource for AsterConnector<R> {
    fn exchange(&self) -> Exchange {
        Exchange::Aster
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn fetch_snapshot(&self) -> Result<SnapshotReport, ExchangeError> {
        let (positions, account, orders) = tokio::join!(
            self.rest.position_risk(),
            self.rest.account(),
            self.rest.open_orders()
        );

        let mut report = SnapshotReport::new(Exchange::Aster);
        report.snapshot.positions = convert_positions(&positions?);

        match account {
            Ok(account) => {
                let (available, locked, equity) = convert_account(&account);
                report.snapshot.available_margin = available;
                report.snapshot.locked_margin = locked;
                report.snapshot.equity = equity;
            }
            Err(e) => {
                warn!("Account fetch failed: {}", e);
                for category in [
                    SnapshotCategory::AvailableMargin,
                    SnapshotCategory::LockedMargin,
                    SnapshotCategory::Equity,
                ] {
                    report.record_gap(category, e.to_string());
                }
            }
        }

        match orders {
            Ok(orders) => report.snapshot.open_orders = convert_open_orders(&orders),
            Err(e) => {
                warn!("Open orders fetch failed: {}", e);
                report.record_gap(SnapshotCategory::OpenOrders, e.to_string());
            }
        }

        debug!(
            positions = report.snapshot.positions.len(),
            orders = report.snapshot.open_orders.len(),
            gaps = report.gaps.len(),
            "Snapshot assembled"
        );
        Ok(report)
    }
}
