pub mod conversions; // raw JSON → canonical entities, contract sizes
pub mod rest; // thin wrapper around RestClient, success envelope
pub mod schema; // shape and field-chain tables
pub mod signer; // HMAC-SHA256 over apiKey + time + payload

pub mod builder;
pub mod connector;

pub use builder::build_connector;
pub use connector::MexcConnector;
pub use signer::MexcSigner;
