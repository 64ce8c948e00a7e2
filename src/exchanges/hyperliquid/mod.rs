pub mod conversions; // raw JSON → canonical entities
pub mod rest; // thin wrapper around RestClient (`/info`)
pub mod schema; // shape and field-chain tables
pub mod types; // request bodies, dex identity

pub mod builder;
pub mod connector;

pub use builder::build_connector;
pub use connector::HyperliquidConnector;
pub use types::{InfoRequest, PerpDex};
