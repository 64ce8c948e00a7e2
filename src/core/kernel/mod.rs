/// perpscope kernel - transport layer shared by every exchange connector
///
/// The kernel holds transport logic and generic interfaces only. Exchange
/// specifics live in `exchanges::<name>` and plug in through the traits
/// below.
///
/// # Architecture
///
/// ## Transport Layer
/// - `RestClient`: unified HTTP client interface (`ReqwestRest`)
/// - `WsSession`: WebSocket connection management (`TungsteniteWs`)
///
/// ## Authentication
/// - `Signer`: pluggable request signing; each exchange provides a strategy
///
/// ## Message Handling
/// - `WsCodec`: exchange-specific handshake encoding and frame decoding
///
/// # Usage
///
/// ```rust,no_run
/// use perpscope::core::kernel::*;
/// use perpscope::exchanges::aster::signer::AsterSigner;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new(
///     "https://fapi.asterdex.com".to_string(),
///     "aster".to_string(),
/// );
/// let signer = Arc::new(AsterSigner::new("key".to_string(), "secret".to_string()));
/// let rest = RestClientBuilder::new(rest_config)
///     .with_signer(signer)
///     .build()?;
///
/// let positions = rest.get("/fapi/v2/positionRisk", &[], true).await?;
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::WsCodec;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{AuthHeaders, SignRequest, SignatureResult, Signer};
pub use ws::{TungsteniteWs, WsConfig, WsSession};
