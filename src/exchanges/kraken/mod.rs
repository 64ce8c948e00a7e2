pub mod codec; // ws/v1 challenge handshake and feed decoding
pub mod conversions; // raw JSON → canonical entities
pub mod rest; // thin wrapper around RestClient, error envelope
pub mod schema; // shape and field-chain tables
pub mod signer; // SHA-256 then HMAC-SHA512 over a base64 secret

pub mod builder;
pub mod connector;

pub use builder::{build_connector, build_stream_client, default_stream_config};
pub use codec::KrakenStreamCodec;
pub use connector::KrakenConnector;
pub use signer::KrakenSigner;
