pub mod conversions; // raw JSON → canonical entities
pub mod rest; // thin wrapper around RestClient
pub mod schema; // shape and field-chain tables
pub mod signer; // HMAC-SHA256 over the sorted query

pub mod builder;
pub mod connector;

pub use builder::build_connector;
pub use connector::AsterConnector;
pub use signer::AsterSigner;
