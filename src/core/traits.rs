use crate::core::{
    errors::ExchangeError,
    types::{Exchange, SnapshotReport},
};
use async_trait::async_trait;

/// A per-exchange pipeline producing one perpetuals snapshot.
///
/// Implementations fetch every category they support, degrading optional
/// categories to empty lists (recorded as gaps in the report) and failing
/// only when a required call fails.
#[async_trait]
pub trait PerpetualsSource: Send + Sync {
    fn exchange(&self) -> Exchange;

    async fn fetch_snapshot(&self) -> Result<SnapshotReport, ExchangeError>;
}
