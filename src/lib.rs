pub mod aggregator;
pub mod core;
pub mod exchanges;
pub mod utils;

pub use aggregator::{AggregateReport, AggregatorConfig, ConnectorAggregator};
pub use core::config::{ConnectorSettings, ExchangeCredentials};
pub use core::stream::{LiveStreamClient, StreamConfig};
pub use core::{errors::ExchangeError, traits::PerpetualsSource, types::*};
pub use utils::ExchangeFactory;
