//! Cross-exchange snapshot aggregation.

use crate::core::config::{ConnectorSettings, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::traits::PerpetualsSource;
use crate::core::types::{Exchange, PerpetualsSnapshot, SnapshotReport};
use crate::utils::ExchangeFactory;
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Extra attempts after a retryable failure
    pub transport_retries: usize,
    /// Delay before the first retry; doubles afterwards
    pub retry_base_delay: Duration,
    pub settings: ConnectorSettings,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            transport_retries: 2,
            retry_base_delay: Duration::from_millis(250),
            settings: ConnectorSettings::default(),
        }
    }
}

impl AggregatorConfig {
    #[must_use]
    pub fn with_retries(mut self, retries: usize, base_delay: Duration) -> Self {
        self.transport_retries = retries;
        self.retry_base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Outcome of `aggregate_all`: whatever succeeded, plus one error per
/// exchange that did not.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub reports: BTreeMap<Exchange, SnapshotReport>,
    pub failures: BTreeMap<Exchange, ExchangeError>,
}

impl AggregateReport {
    pub fn snapshot(&self, exchange: Exchange) -> Option<&PerpetualsSnapshot> {
        self.reports.get(&exchange).map(|report| &report.snapshot)
    }

    /// All successful snapshots concatenated, ordered by exchange
    pub fn merged(&self) -> PerpetualsSnapshot {
        let mut merged = PerpetualsSnapshot::default();
        for report in self.reports.values() {
            merged.extend(report.snapshot.clone());
        }
        merged
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.reports.values().all(|r| !r.is_degraded())
    }
}

/// Runs exchange pipelines concurrently and merges their snapshots.
#[derive(Debug, Clone, Default)]
pub struct ConnectorAggregator {
    config: AggregatorConfig,
}

impl ConnectorAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Snapshot of one exchange, retrying transport failures.
    #[instrument(skip(self, credentials), fields(exchange = %exchange))]
    pub async fn fetch_snapshot(
        &self,
        exchange: Exchange,
        credentials: &ExchangeCredentials,
    ) -> Result<SnapshotReport, ExchangeError> {
        let source = ExchangeFactory::create_source(exchange, credentials, &self.config.settings)?;
        self.fetch_with_retry(source.as_ref()).await
    }

    /// Run `source`, retrying only errors that are safe to repeat.
    pub async fn fetch_with_retry(
        &self,
        source: &dyn PerpetualsSource,
    ) -> Result<SnapshotReport, ExchangeError> {
        // 2^n * factor ms: base, 2*base, 4*base, ..
        let factor = (self.config.retry_base_delay.as_millis() / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(u64::try_from(factor).unwrap_or(u64::MAX))
            .take(self.config.transport_retries);

        RetryIf::spawn(
            strategy,
            || source.fetch_snapshot(),
            |e: &ExchangeError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(exchange = %source.exchange(), "Retrying after transport failure: {}", e);
                }
                retry
            },
        )
        .await
    }

    /// Fetch every configured exchange concurrently. One exchange failing
    /// never affects the others.
    #[instrument(skip_all, fields(exchanges = credentials.len()))]
    pub async fn aggregate_all(
        &self,
        credentials: &HashMap<Exchange, ExchangeCredentials>,
    ) -> AggregateReport {
        let results = join_all(credentials.iter().map(|(exchange, creds)| async move {
            (*exchange, self.fetch_snapshot(*exchange, creds).await)
        }))
        .await;

        let mut aggregate = AggregateReport::default();
        for (exchange, result) in results {
            match result {
                Ok(report) => {
                    info!(
                        exchange = %exchange,
                        positions = report.snapshot.positions.len(),
                        gaps = report.gaps.len(),
                        "Snapshot fetched"
                    );
                    aggregate.reports.insert(exchange, report);
                }
                Err(e) => {
                    warn!(exchange = %exchange, "Snapshot failed: {}", e);
                    aggregate.failures.insert(exchange, e);
                }
            }
        }
        aggregate
    }
}
